//! Travel demand: one fixed-route trip per vehicle.
//!
//! Routes are inputs; nothing in the engine chooses or changes them.

use rustc_hash::FxHashMap;

use ls_core::{LinkId, SimTime, VehicleId};

use crate::{NetworkError, NetworkResult};

/// A vehicle's trip: depart onto `route[0]` at `departure`, then traverse
/// the route in order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trip {
    pub vehicle:   VehicleId,
    pub departure: SimTime,
    pub route:     Vec<LinkId>,
}

impl Trip {
    pub fn new(vehicle: VehicleId, departure: SimTime, route: Vec<LinkId>) -> Self {
        Self { vehicle, departure, route }
    }

    /// Link at position `leg`, if the route is that long.
    #[inline]
    pub fn link_at(&self, leg: u32) -> Option<LinkId> {
        self.route.get(leg as usize).copied()
    }

    #[inline]
    pub fn first_link(&self) -> Option<LinkId> {
        self.route.first().copied()
    }
}

/// All trips of a run, looked up by vehicle.
#[derive(Debug, Clone, Default)]
pub struct Demand {
    trips:      Vec<Trip>,
    by_vehicle: FxHashMap<VehicleId, usize>,
}

impl Demand {
    /// Index `trips` by vehicle.  Vehicle ids must be unique; per-trip
    /// checks against the network happen in [`Scenario::new`][crate::Scenario::new].
    pub fn new(trips: Vec<Trip>) -> NetworkResult<Self> {
        let mut by_vehicle = FxHashMap::default();
        by_vehicle.reserve(trips.len());
        for (i, trip) in trips.iter().enumerate() {
            if by_vehicle.insert(trip.vehicle, i).is_some() {
                return Err(NetworkError::DuplicateVehicle(trip.vehicle));
            }
        }
        Ok(Self { trips, by_vehicle })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn trip(&self, vehicle: VehicleId) -> Option<&Trip> {
        self.by_vehicle.get(&vehicle).map(|&i| &self.trips[i])
    }

    /// Trips in input order.
    pub fn iter(&self) -> impl Iterator<Item = &Trip> {
        self.trips.iter()
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}
