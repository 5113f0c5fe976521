//! Network partition and the link → worker ownership index.
//!
//! A [`Partition`] is the ordered list of clusters handed in by the caller
//! (graph clustering happens elsewhere).  Cluster `i` is owned by
//! `WorkerId(i)` for the whole run.
//!
//! [`OwnerIndex`] is the dense lookup built from it: one [`Slot`] per link
//! holding the owning worker and the link's position inside that worker's
//! cluster, so a worker can address its own link-state array directly.
//! Building the index is where the partition invariant is enforced; a
//! successfully built index has exactly one owner per link.

use ls_core::{LinkId, WorkerId};

use crate::{NetworkError, NetworkResult};

/// Ordered sequence of disjoint link clusters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    clusters: Vec<Vec<LinkId>>,
}

impl Partition {
    /// Wrap pre-computed clusters.  Validation happens in
    /// [`OwnerIndex::build`].
    pub fn new(clusters: Vec<Vec<LinkId>>) -> Self {
        Self { clusters }
    }

    /// Every link in one cluster: the sequential reference layout.
    pub fn single(link_count: usize) -> Self {
        Self::new(vec![(0..link_count).map(|i| LinkId(i as u32)).collect()])
    }

    /// Split links `0..link_count` into `k` contiguous blocks of near-equal
    /// size.  `k` is clamped to `1..=link_count`.
    pub fn contiguous(link_count: usize, k: usize) -> Self {
        let k = k.clamp(1, link_count.max(1));
        let mut clusters = vec![Vec::new(); k];
        for i in 0..link_count {
            clusters[i * k / link_count.max(1)].push(LinkId(i as u32));
        }
        Self::new(clusters)
    }

    /// Build from a per-link cluster label (`labels[link] = cluster`).
    /// Labels need not be dense; clusters are ordered by ascending label.
    pub fn from_labels(labels: &[u32]) -> Self {
        let mut distinct: Vec<u32> = labels.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        let mut clusters = vec![Vec::new(); distinct.len()];
        for (i, label) in labels.iter().enumerate() {
            // `distinct` contains every label, so the search always hits.
            if let Ok(pos) = distinct.binary_search(label) {
                clusters[pos].push(LinkId(i as u32));
            }
        }
        Self::new(clusters)
    }

    pub fn clusters(&self) -> &[Vec<LinkId>] {
        &self.clusters
    }

    /// Links owned by `worker`.  Empty slice for an unknown worker.
    pub fn cluster(&self, worker: WorkerId) -> &[LinkId] {
        self.clusters.get(worker.index()).map_or(&[], Vec::as_slice)
    }

    pub fn worker_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn workers(&self) -> impl Iterator<Item = WorkerId> + '_ {
        (0..self.clusters.len()).map(|i| WorkerId(i as u32))
    }
}

/// Where a link lives: its owning worker and its index within that worker's
/// cluster.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub worker: WorkerId,
    pub local:  u32,
}

/// Dense `LinkId → Slot` lookup.  Built once, read-only during the run.
#[derive(Debug, Clone)]
pub struct OwnerIndex {
    slots: Vec<Slot>,
}

impl OwnerIndex {
    /// Build the index and enforce the partition invariant: every link in
    /// `0..link_count` appears in exactly one cluster, and no cluster is
    /// empty or names a link outside the network.
    pub fn build(partition: &Partition, link_count: usize) -> NetworkResult<Self> {
        if partition.worker_count() == 0 {
            return Err(NetworkError::NoClusters);
        }
        let unassigned = Slot { worker: WorkerId::INVALID, local: u32::MAX };
        let mut slots = vec![unassigned; link_count];

        for (w, cluster) in partition.clusters().iter().enumerate() {
            let worker = WorkerId(w as u32);
            if cluster.is_empty() {
                return Err(NetworkError::EmptyCluster(worker));
            }
            for (local, &link) in cluster.iter().enumerate() {
                let slot = slots.get_mut(link.index()).ok_or(NetworkError::UnknownLink(link))?;
                if slot.worker != WorkerId::INVALID {
                    return Err(NetworkError::DuplicateAssignment {
                        link,
                        first:  slot.worker,
                        second: worker,
                    });
                }
                *slot = Slot { worker, local: local as u32 };
            }
        }

        if let Some(i) = slots.iter().position(|s| s.worker == WorkerId::INVALID) {
            return Err(NetworkError::UnassignedLink(LinkId(i as u32)));
        }
        Ok(Self { slots })
    }

    #[inline]
    pub fn slot(&self, link: LinkId) -> Option<Slot> {
        self.slots.get(link.index()).copied()
    }

    #[inline]
    pub fn owner(&self, link: LinkId) -> Option<WorkerId> {
        self.slots.get(link.index()).map(|s| s.worker)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
