// Licensed under the Apache-2.0 license

//! Interconnect planning.
//!
//! The shared bus picks the simplest structure that fits the node count:
//!
//! | masters | slaves | interconnect                      |
//! |---------|--------|-----------------------------------|
//! | 1       | 1      | [`Interconnect::Direct`]            |
//! | 1       | N      | [`Interconnect::Decoder`]           |
//! | N       | 1      | [`Interconnect::Arbiter`]           |
//! | N       | M      | [`Interconnect::ArbiterAndDecoder`] |
//!
//! A crossbar instead gives every master its own decoder over the slaves it
//! can reach, and a grant matrix telling which master may talk to which
//! slave.

use crate::node::{WbMaster, WbNode, WbSlave};
use crate::solver::address_lo;
use serde::Deserialize;
use strum_macros::{Display, EnumIter};
use wbgen_common::AddressRange;

/// How masters share the slaves.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Display, EnumIter,
)]
pub enum Topology {
    /// One transaction at a time, arbitrated between masters.
    #[default]
    SharedBus,
    /// Concurrent transactions to distinct slaves.
    Crossbar,
}

/// A decoder entry: bus addresses in `window` select `slave`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub slave: String,
    pub window: AddressRange,
}

/// One master's side of a crossbar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MasterPort {
    pub master: String,
    /// Bus byte addresses the master can drive.
    pub reach: AddressRange,
    /// Slaves whose window intersects `reach`, in slave order.
    pub routes: Vec<Route>,
}

/// Resolved connection structure of a bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interconnect {
    Direct {
        master: String,
        route: Route,
    },
    Decoder {
        master: String,
        routes: Vec<Route>,
    },
    Arbiter {
        masters: Vec<String>,
        route: Route,
    },
    /// Masters are arbitrated first, then the winner's address is decoded.
    ArbiterAndDecoder {
        masters: Vec<String>,
        routes: Vec<Route>,
    },
    Crossbar {
        ports: Vec<MasterPort>,
        slaves: Vec<String>,
        /// `grants[m][s]` is true if master `m` can reach slave `s`.
        grants: Vec<Vec<bool>>,
    },
}

impl Interconnect {
    pub(crate) fn plan(topology: Topology, masters: &[WbMaster], slaves: &[WbSlave]) -> Self {
        let master_names = || masters.iter().map(|m| m.name().to_string()).collect::<Vec<_>>();
        let routes = || slaves.iter().map(route).collect::<Vec<_>>();

        match topology {
            Topology::SharedBus => match (masters, slaves) {
                ([master], [slave]) => Interconnect::Direct {
                    master: master.name().to_string(),
                    route: route(slave),
                },
                ([master], _) => Interconnect::Decoder {
                    master: master.name().to_string(),
                    routes: routes(),
                },
                (_, [slave]) => Interconnect::Arbiter {
                    masters: master_names(),
                    route: route(slave),
                },
                _ => Interconnect::ArbiterAndDecoder {
                    masters: master_names(),
                    routes: routes(),
                },
            },
            Topology::Crossbar => {
                let ports: Vec<MasterPort> = masters
                    .iter()
                    .map(|master| {
                        let reach = master_reach(master);
                        MasterPort {
                            master: master.name().to_string(),
                            reach,
                            routes: slaves
                                .iter()
                                .filter(|s| s.window().overlaps(&reach))
                                .map(route)
                                .collect(),
                        }
                    })
                    .collect();
                let grants = ports
                    .iter()
                    .map(|port| {
                        slaves
                            .iter()
                            .map(|s| port.routes.iter().any(|r| r.slave == s.name()))
                            .collect()
                    })
                    .collect();
                Interconnect::Crossbar {
                    ports,
                    slaves: slaves.iter().map(|s| s.name().to_string()).collect(),
                    grants,
                }
            }
        }
    }

    /// Decoder entries seen by `master`; empty if `master` is not connected.
    pub fn routes(&self, master: &str) -> &[Route] {
        match self {
            Interconnect::Direct { master: m, route } if m == master => std::slice::from_ref(route),
            Interconnect::Decoder { master: m, routes } if m == master => routes,
            Interconnect::Arbiter { masters, route } if masters.iter().any(|m| m == master) => {
                std::slice::from_ref(route)
            }
            Interconnect::ArbiterAndDecoder { masters, routes }
                if masters.iter().any(|m| m == master) =>
            {
                routes
            }
            Interconnect::Crossbar { ports, .. } => ports
                .iter()
                .find(|p| p.master == master)
                .map(|p| p.routes.as_slice())
                .unwrap_or(&[]),
            _ => &[],
        }
    }

    /// The slave `master` reaches at bus byte address `address`.
    pub fn decode(&self, master: &str, address: u64) -> Option<&str> {
        self.routes(master)
            .iter()
            .find(|r| r.window.contains(address))
            .map(|r| r.slave.as_str())
    }
}

fn route(slave: &WbSlave) -> Route {
    Route {
        slave: slave.name().to_string(),
        window: slave.window(),
    }
}

/// Byte addresses spanned by the master's own address lines.
fn master_reach(master: &WbMaster) -> AddressRange {
    let bits = master
        .address_size()
        .saturating_add(address_lo(&master.shape()));
    match 1u64.checked_shl(bits) {
        Some(size) => AddressRange::new(0, size),
        None => AddressRange {
            start: 0,
            end: u64::MAX,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeShape;
    use strum::IntoEnumIterator;
    use wbgen_common::{Address, EntityPath};

    fn master(name: &str, port_size: u32, address_size: u32) -> WbMaster {
        WbMaster {
            path: EntityPath::new("bus").join(name),
            shape: NodeShape::new(port_size, 8, address_size),
            address_shift: 0,
        }
    }

    fn slave(name: &str, start: u64, size: u64) -> WbSlave {
        WbSlave {
            path: EntityPath::new("bus").join(name),
            shape: NodeShape::new(32, 8, 4),
            requested_address: Address::Explicit(start),
            window: AddressRange::new(start, size),
            register_set: None,
        }
    }

    #[test]
    fn test_topology_names() {
        let names: Vec<String> = Topology::iter().map(|t| t.to_string()).collect();
        assert_eq!(names, ["SharedBus", "Crossbar"]);
        assert_eq!(Topology::default(), Topology::SharedBus);
    }

    #[test]
    fn test_shared_bus_shapes() {
        let one_master = [master("cpu", 32, 8)];
        let two_masters = [master("cpu", 32, 8), master("dma", 32, 8)];
        let one_slave = [slave("ram", 0x0, 0x40)];
        let two_slaves = [slave("ram", 0x0, 0x40), slave("uart", 0x40, 0x40)];

        assert!(matches!(
            Interconnect::plan(Topology::SharedBus, &one_master, &one_slave),
            Interconnect::Direct { .. }
        ));
        assert!(matches!(
            Interconnect::plan(Topology::SharedBus, &one_master, &two_slaves),
            Interconnect::Decoder { .. }
        ));
        assert!(matches!(
            Interconnect::plan(Topology::SharedBus, &two_masters, &one_slave),
            Interconnect::Arbiter { .. }
        ));
        let shared = Interconnect::plan(Topology::SharedBus, &two_masters, &two_slaves);
        match &shared {
            Interconnect::ArbiterAndDecoder { masters, routes } => {
                assert_eq!(masters, &["cpu", "dma"]);
                assert_eq!(routes.len(), 2);
            }
            other => panic!("unexpected interconnect {other:?}"),
        }
        assert_eq!(shared.decode("dma", 0x44), Some("uart"));
        assert_eq!(shared.decode("dma", 0x80), None);
        assert_eq!(shared.decode("gpu", 0x0), None);
    }

    #[test]
    fn test_crossbar_grants() {
        // "small" drives 16 byte addresses, "large" 2^12
        let masters = [master("small", 32, 2), master("large", 32, 10)];
        let slaves = [slave("ram", 0x0, 0x10), slave("rom", 0x100, 0x100)];

        let crossbar = Interconnect::plan(Topology::Crossbar, &masters, &slaves);
        match &crossbar {
            Interconnect::Crossbar {
                ports,
                slaves,
                grants,
            } => {
                assert_eq!(ports[0].reach, AddressRange::new(0, 0x10));
                assert_eq!(ports[1].reach, AddressRange::new(0, 0x1000));
                assert_eq!(slaves, &["ram", "rom"]);
                assert_eq!(grants, &[vec![true, false], vec![true, true]]);
            }
            other => panic!("unexpected interconnect {other:?}"),
        }
        assert_eq!(crossbar.decode("large", 0x1FF), Some("rom"));
        assert_eq!(crossbar.decode("small", 0x100), None);
    }

    #[test]
    fn test_reach_saturates() {
        let wide = master("wide", 64, 62);
        assert_eq!(master_reach(&wide).end, u64::MAX);
    }
}
