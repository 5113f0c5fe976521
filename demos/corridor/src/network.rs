//! Synthetic two-way arterial with an on- and off-ramp at every junction.

use ls_core::{LinkId, NodeId};
use ls_network::{Network, NetworkBuilder, NetworkResult, Partition, VolumeDelay};

/// Link ids of the corridor, by role.  Junction `i` sits between main-line
/// segments `i - 1` and `i`.
pub struct Corridor {
    pub network:   Network,
    pub eastbound: Vec<LinkId>,
    pub westbound: Vec<LinkId>,
    pub on_ramp:   Vec<LinkId>,
    pub off_ramp:  Vec<LinkId>,
}

/// Build a corridor with `junctions` main-line nodes, each with a side
/// street node feeding it.
///
/// Main-line segments are 800 m at 50 km/h with capacity 30 vehicles;
/// ramps are 200 m at 30 km/h with capacity 8.
pub fn build_corridor(junctions: u32) -> NetworkResult<Corridor> {
    let mut b = NetworkBuilder::new().volume_delay(VolumeDelay::BPR);
    b.reserve_nodes(2 * junctions as usize);
    let junction = |i: u32| NodeId(i);
    let street = |i: u32| NodeId(junctions + i);

    let segment_s = 800.0 / (50.0 / 3.6);
    let ramp_s = 200.0 / (30.0 / 3.6);

    let mut eastbound = Vec::new();
    let mut westbound = Vec::new();
    for i in 0..junctions.saturating_sub(1) {
        eastbound.push(b.add_link(junction(i), junction(i + 1), 800.0, segment_s, 30.0));
        westbound.push(b.add_link(junction(i + 1), junction(i), 800.0, segment_s, 30.0));
    }
    let mut on_ramp = Vec::new();
    let mut off_ramp = Vec::new();
    for i in 0..junctions {
        on_ramp.push(b.add_link(street(i), junction(i), 200.0, ramp_s, 8.0));
        off_ramp.push(b.add_link(junction(i), street(i), 200.0, ramp_s, 8.0));
    }

    Ok(Corridor { network: b.build()?, eastbound, westbound, on_ramp, off_ramp })
}

impl Corridor {
    pub fn junctions(&self) -> usize {
        self.on_ramp.len()
    }

    /// On-ramp at `from`, main line to `to`, off-ramp at `to`.
    pub fn route(&self, from: usize, to: usize) -> Vec<LinkId> {
        let mut route = vec![self.on_ramp[from]];
        if from < to {
            route.extend_from_slice(&self.eastbound[from..to]);
        } else {
            route.extend(self.westbound[to..from].iter().rev());
        }
        route.push(self.off_ramp[to]);
        route
    }

    /// Split the corridor into `sections` consecutive stretches.  Every link
    /// belongs to the section of the junction it leaves from.
    pub fn sections(&self, sections: usize) -> Partition {
        let n = self.junctions().max(1);
        let section = |node: NodeId| {
            let junction = node.index() % n;
            (junction * sections / n) as u32
        };
        let labels: Vec<u32> = self
            .network
            .links()
            .map(|l| section(self.network.link_from[l.index()]))
            .collect();
        Partition::from_labels(&labels)
    }
}
