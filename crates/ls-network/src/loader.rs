//! CSV scenario loader.
//!
//! # CSV formats
//!
//! **Links**: one row per directed link.  `link_id` values must be dense
//! (`0..n`, any row order); node ids are implied by the largest id seen.
//!
//! ```csv
//! link_id,from,to,length_m,free_flow_s,capacity
//! 0,0,1,250.0,10.0,20
//! 1,1,2,400.0,15.0,20
//! ```
//!
//! **Clusters**: one row per link.  Labels are arbitrary integers;
//! clusters are ordered by ascending label and become workers `0..k`.
//!
//! ```csv
//! link_id,cluster
//! 0,0
//! 1,1
//! ```
//!
//! **Trips**: one row per vehicle; `route` is a space-separated link list.
//!
//! ```csv
//! vehicle_id,departure_s,route
//! 0,0.0,0 1
//! ```

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use ls_core::{LinkId, NodeId, SimTime, VehicleId};

use crate::{Demand, Network, NetworkBuilder, NetworkError, Partition, Trip, VolumeDelay};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LinkRecord {
    link_id:     u32,
    from:        u32,
    to:          u32,
    length_m:    f64,
    free_flow_s: f64,
    capacity:    f64,
}

#[derive(Deserialize)]
struct ClusterRecord {
    link_id: u32,
    cluster: u32,
}

#[derive(Deserialize)]
struct TripRecord {
    vehicle_id:  u32,
    departure_s: f64,
    route:       String,
}

// ── Links ─────────────────────────────────────────────────────────────────────

/// Load a [`Network`] from a links CSV file.
pub fn load_network_csv(path: &Path, delay: VolumeDelay) -> Result<Network, NetworkError> {
    let file = std::fs::File::open(path).map_err(NetworkError::Io)?;
    load_network_reader(file, delay)
}

/// Like [`load_network_csv`] but accepts any `Read` source.
pub fn load_network_reader<R: Read>(reader: R, delay: VolumeDelay) -> Result<Network, NetworkError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows: Vec<LinkRecord> = Vec::new();
    for result in csv_reader.deserialize::<LinkRecord>() {
        rows.push(result.map_err(|e| NetworkError::Parse(e.to_string()))?);
    }
    rows.sort_by_key(|r| r.link_id);

    let mut builder = NetworkBuilder::with_capacity(rows.len()).volume_delay(delay);
    let max_node = rows.iter().map(|r| r.from.max(r.to) as usize + 1).max().unwrap_or(0);
    builder.reserve_nodes(max_node);

    for (expected, row) in rows.iter().enumerate() {
        if row.link_id as usize != expected {
            return Err(NetworkError::Parse(format!(
                "link ids must be dense from 0: expected {expected}, found {}",
                row.link_id
            )));
        }
        builder.add_link(NodeId(row.from), NodeId(row.to), row.length_m, row.free_flow_s, row.capacity);
    }
    builder.build()
}

// ── Clusters ──────────────────────────────────────────────────────────────────

/// Load a [`Partition`] from a clusters CSV file.
pub fn load_partition_csv(path: &Path, link_count: usize) -> Result<Partition, NetworkError> {
    let file = std::fs::File::open(path).map_err(NetworkError::Io)?;
    load_partition_reader(file, link_count)
}

/// Like [`load_partition_csv`] but accepts any `Read` source.
///
/// Every link in `0..link_count` must have exactly one row; the ownership
/// invariant is checked again when the scenario is assembled.
pub fn load_partition_reader<R: Read>(reader: R, link_count: usize) -> Result<Partition, NetworkError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut labels: Vec<Option<u32>> = vec![None; link_count];

    for result in csv_reader.deserialize::<ClusterRecord>() {
        let row = result.map_err(|e| NetworkError::Parse(e.to_string()))?;
        let link = LinkId(row.link_id);
        let slot = labels.get_mut(link.index()).ok_or(NetworkError::UnknownLink(link))?;
        if slot.is_some() {
            return Err(NetworkError::Parse(format!("{link} listed twice in cluster file")));
        }
        *slot = Some(row.cluster);
    }

    let labels: Vec<u32> = labels
        .into_iter()
        .enumerate()
        .map(|(i, l)| l.ok_or(NetworkError::UnassignedLink(LinkId(i as u32))))
        .collect::<Result<_, _>>()?;
    Ok(Partition::from_labels(&labels))
}

// ── Trips ─────────────────────────────────────────────────────────────────────

/// Load [`Demand`] from a trips CSV file.
pub fn load_demand_csv(path: &Path) -> Result<Demand, NetworkError> {
    let file = std::fs::File::open(path).map_err(NetworkError::Io)?;
    load_demand_reader(file)
}

/// Like [`load_demand_csv`] but accepts any `Read` source.
pub fn load_demand_reader<R: Read>(reader: R) -> Result<Demand, NetworkError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut trips = Vec::new();
    for result in csv_reader.deserialize::<TripRecord>() {
        let row = result.map_err(|e| NetworkError::Parse(e.to_string()))?;
        let route = parse_route(&row.route)?;
        trips.push(Trip::new(VehicleId(row.vehicle_id), SimTime::new(row.departure_s), route));
    }
    Demand::new(trips)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_route(s: &str) -> Result<Vec<LinkId>, NetworkError> {
    s.split_whitespace()
        .map(|tok| {
            tok.parse::<u32>().map(LinkId).map_err(|_| {
                NetworkError::Parse(format!("invalid link id {tok:?} in route {s:?}"))
            })
        })
        .collect()
}
