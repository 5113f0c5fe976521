//! Road network representation and builder.
//!
//! # Data layout
//!
//! Link attributes live in parallel arrays indexed by `LinkId`
//! (`link_from`, `link_to`, `link_length_m`, `link_free_flow_s`,
//! `link_capacity`).  Link ids are assigned in insertion order and never
//! change, because partitions and routes refer to them.
//!
//! Outgoing links per node use **Compressed Sparse Row (CSR)** format over a
//! separate permutation array:
//!
//! ```text
//! out_links[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! Iterating a node's outgoing links is a contiguous memory scan.

use ls_core::{LinkId, NodeId};

use crate::{NetworkError, NetworkResult, VolumeDelay};

// ── Network ───────────────────────────────────────────────────────────────────

/// Directed link graph with per-link free-flow time and capacity.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`NetworkBuilder`].
#[derive(Debug, Clone)]
pub struct Network {
    /// Number of nodes.  Node ids are `0..node_count`.
    pub node_count: usize,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    /// CSR row pointer into `out_links`.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Link ids sorted by source node.
    pub out_links: Vec<LinkId>,

    // ── Link data (indexed by LinkId) ─────────────────────────────────────
    pub link_from: Vec<NodeId>,

    pub link_to: Vec<NodeId>,

    /// Physical length in metres.  Informational; travel time comes from
    /// `link_free_flow_s` and the volume-delay function.
    pub link_length_m: Vec<f64>,

    /// Travel time of an empty link, in seconds.  Always finite and > 0.
    pub link_free_flow_s: Vec<f64>,

    /// Vehicles the link carries before congestion sets in.  Always finite
    /// and > 0.
    pub link_capacity: Vec<f64>,

    /// Travel-time function shared by every link.
    pub delay: VolumeDelay,
}

impl Network {
    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn link_count(&self) -> usize {
        self.link_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.link_to.is_empty()
    }

    #[inline]
    pub fn contains(&self, link: LinkId) -> bool {
        link.index() < self.link_count()
    }

    /// Iterator over every `LinkId` in the network.
    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        (0..self.link_count()).map(|i| LinkId(i as u32))
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the outgoing links of `node`.
    #[inline]
    pub fn out_links(&self, node: NodeId) -> impl Iterator<Item = LinkId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        self.out_links[start..end].iter().copied()
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// `true` if a vehicle can move directly from `from` onto `to`.
    #[inline]
    pub fn connects(&self, from: LinkId, to: LinkId) -> bool {
        self.link_to[from.index()] == self.link_from[to.index()]
    }

    // ── Link flow ─────────────────────────────────────────────────────────

    #[inline]
    pub fn free_flow(&self, link: LinkId) -> f64 {
        self.link_free_flow_s[link.index()]
    }

    #[inline]
    pub fn capacity(&self, link: LinkId) -> f64 {
        self.link_capacity[link.index()]
    }

    /// Seconds a vehicle needs to traverse `link` when `volume` vehicles are
    /// already on it.
    #[inline]
    pub fn travel_time(&self, link: LinkId, volume: u32) -> f64 {
        let i = link.index();
        self.delay.travel_time(self.link_free_flow_s[i], self.link_capacity[i], f64::from(volume))
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`Network`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use ls_network::NetworkBuilder;
///
/// let mut b = NetworkBuilder::new();
/// let [a, c, d] = [b.add_node(), b.add_node(), b.add_node()];
/// let ab = b.add_link(a, c, 250.0, 10.0, 20.0);
/// let bc = b.add_link(c, d, 400.0, 15.0, 20.0);
/// let net = b.build().unwrap();
/// assert_eq!(net.link_count(), 2);
/// assert!(net.connects(ab, bc));
/// ```
pub struct NetworkBuilder {
    node_count: usize,
    raw_links:  Vec<RawLink>,
    delay:      VolumeDelay,
}

struct RawLink {
    from:        NodeId,
    to:          NodeId,
    length_m:    f64,
    free_flow_s: f64,
    capacity:    f64,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self { node_count: 0, raw_links: Vec::new(), delay: VolumeDelay::default() }
    }

    /// Pre-allocate for the expected number of links.
    pub fn with_capacity(links: usize) -> Self {
        Self { node_count: 0, raw_links: Vec::with_capacity(links), delay: VolumeDelay::default() }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.node_count as u32);
        self.node_count += 1;
        id
    }

    /// Ensure nodes `0..n` exist.
    pub fn reserve_nodes(&mut self, n: usize) {
        self.node_count = self.node_count.max(n);
    }

    /// Add a **directed** link and return its `LinkId` (sequential from 0).
    ///
    /// - `free_flow_s`: travel time of the empty link, seconds.
    /// - `capacity`: vehicles before congestion.
    pub fn add_link(
        &mut self,
        from:        NodeId,
        to:          NodeId,
        length_m:    f64,
        free_flow_s: f64,
        capacity:    f64,
    ) -> LinkId {
        let id = LinkId(self.raw_links.len() as u32);
        self.raw_links.push(RawLink { from, to, length_m, free_flow_s, capacity });
        id
    }

    /// Replace the default BPR volume-delay function.
    pub fn volume_delay(mut self, delay: VolumeDelay) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_volume_delay(&mut self, delay: VolumeDelay) {
        self.delay = delay;
    }

    pub fn node_count(&self) -> usize { self.node_count }
    pub fn link_count(&self) -> usize { self.raw_links.len() }

    /// Validate every link and produce a [`Network`].
    ///
    /// Time complexity: O(L log L) for the CSR sort.
    pub fn build(self) -> NetworkResult<Network> {
        let node_count = self.node_count;
        let link_count = self.raw_links.len();
        let delay = VolumeDelay::new(self.delay.alpha, self.delay.beta)?;

        for (i, l) in self.raw_links.iter().enumerate() {
            let link = LinkId(i as u32);
            for node in [l.from, l.to] {
                if node.index() >= node_count {
                    return Err(NetworkError::UnknownNode(node));
                }
            }
            if !l.free_flow_s.is_finite() || l.free_flow_s <= 0.0 {
                return Err(NetworkError::InvalidLink {
                    link,
                    reason: format!("free-flow time must be finite and > 0, got {}", l.free_flow_s),
                });
            }
            if !l.capacity.is_finite() || l.capacity <= 0.0 {
                return Err(NetworkError::InvalidLink {
                    link,
                    reason: format!("capacity must be finite and > 0, got {}", l.capacity),
                });
            }
        }

        // Stable sort keeps insertion order among links sharing a source node.
        let mut out_links: Vec<LinkId> = (0..link_count).map(|i| LinkId(i as u32)).collect();
        out_links.sort_by_key(|l| self.raw_links[l.index()].from.0);

        let mut node_out_start = vec![0u32; node_count + 1];
        for l in &self.raw_links {
            node_out_start[l.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, link_count);

        let raw = self.raw_links;
        Ok(Network {
            node_count,
            node_out_start,
            out_links,
            link_from:        raw.iter().map(|l| l.from).collect(),
            link_to:          raw.iter().map(|l| l.to).collect(),
            link_length_m:    raw.iter().map(|l| l.length_m).collect(),
            link_free_flow_s: raw.iter().map(|l| l.free_flow_s).collect(),
            link_capacity:    raw.iter().map(|l| l.capacity).collect(),
            delay,
        })
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
