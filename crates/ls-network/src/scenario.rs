//! The validated, immutable input bundle of a run.

use ls_core::{LinkId, WorkerId};

use crate::{Demand, Network, NetworkError, NetworkResult, OwnerIndex, Partition, Slot, VolumeDelay};

/// Network + partition + demand, checked for consistency once.
///
/// Workers receive a shared reference for every call; nothing in here is
/// mutated after [`Scenario::new`] returns.
#[derive(Debug, Clone)]
pub struct Scenario {
    network:   Network,
    partition: Partition,
    owners:    OwnerIndex,
    demand:    Demand,
}

impl Scenario {
    /// Validate and bundle the inputs.
    ///
    /// Fails fast on any partition violation (unassigned, duplicated, or
    /// unknown link; empty cluster) and on any trip that cannot be driven
    /// (empty or disconnected route, unknown link, bad departure time).
    /// The network's volume-delay parameters are re-checked since
    /// `Network::delay` is a public field.
    pub fn new(network: Network, partition: Partition, demand: Demand) -> NetworkResult<Self> {
        VolumeDelay::new(network.delay.alpha, network.delay.beta)?;
        let owners = OwnerIndex::build(&partition, network.link_count())?;

        for trip in demand.iter() {
            if !trip.departure.is_valid_input() {
                return Err(NetworkError::InvalidDeparture {
                    vehicle:   trip.vehicle,
                    departure: trip.departure,
                });
            }
            if trip.route.is_empty() {
                return Err(NetworkError::EmptyRoute(trip.vehicle));
            }
            if let Some(&bad) = trip.route.iter().find(|l| !network.contains(**l)) {
                return Err(NetworkError::UnknownLink(bad));
            }
            if let Some(pair) = trip.route.windows(2).find(|w| !network.connects(w[0], w[1])) {
                return Err(NetworkError::DisconnectedRoute {
                    vehicle: trip.vehicle,
                    from:    pair[0],
                    to:      pair[1],
                });
            }
        }

        Ok(Self { network, partition, owners, demand })
    }

    /// Same network and demand, different clustering.
    pub fn repartition(&self, partition: Partition) -> NetworkResult<Self> {
        Self::new(self.network.clone(), partition, self.demand.clone())
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn owners(&self) -> &OwnerIndex {
        &self.owners
    }

    pub fn demand(&self) -> &Demand {
        &self.demand
    }

    pub fn worker_count(&self) -> usize {
        self.partition.worker_count()
    }

    #[inline]
    pub fn owner(&self, link: LinkId) -> Option<WorkerId> {
        self.owners.owner(link)
    }

    #[inline]
    pub fn slot(&self, link: LinkId) -> Option<Slot> {
        self.owners.slot(link)
    }
}
