//! CLI subcommands.

use anyhow::Context;
use async_trait::async_trait;
use clap::Subcommand;
use corelib::{HashRing, NodeId, RingBuilder, RingKind};
use grid::{Answer, Delivery, Grid, GridConfig, GridMessage, Inbound, LoopbackNetwork};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, trace};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the node owning a key
    Owner {
        /// Comma-separated node ids
        #[arg(long, value_delimiter = ',', required = true)]
        nodes: Vec<String>,

        #[arg(long)]
        key: String,
    },

    /// Count how many sample keys each node owns
    Distribution {
        #[arg(long, value_delimiter = ',', required = true)]
        nodes: Vec<String>,

        #[arg(long, default_value_t = 10_000)]
        samples: usize,
    },

    /// Check that the array, list and map rings agree on every sample key
    Compare {
        #[arg(long, value_delimiter = ',', required = true)]
        nodes: Vec<String>,

        #[arg(long, default_value_t = 10_000)]
        samples: usize,
    },

    /// Route one delivery through in-process nodes and print its path
    Simulate {
        #[arg(long, default_value = "order-42")]
        key: String,

        #[arg(long, value_delimiter = ',', default_value = "node-a,node-b")]
        nodes: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Owner {
        key: String,
        owner: Option<NodeId>,
    },
    Distribution {
        samples: usize,
        counts: BTreeMap<NodeId, usize>,
    },
    Comparison {
        samples: usize,
        disagreements: usize,
    },
    Simulation {
        key: String,
        owner: Option<NodeId>,
        route: Vec<(NodeId, NodeId)>,
        delivered_on: Vec<NodeId>,
    },
}

impl Command {
    pub fn execute(&self, config: &GridConfig) -> anyhow::Result<CommandResult> {
        match self {
            Command::Owner { nodes, key } => {
                let ring = build_ring(config, config.ring, nodes);
                Ok(CommandResult::Owner {
                    key: key.clone(),
                    owner: ring.node_of(key.as_bytes()),
                })
            }
            Command::Distribution { nodes, samples } => {
                let ring = build_ring(config, config.ring, nodes);
                let mut counts: BTreeMap<NodeId, usize> =
                    ring.nodes().into_iter().map(|node| (node, 0)).collect();
                for i in 0..*samples {
                    if let Some(owner) = ring.node_of(sample_key(i).as_bytes()) {
                        *counts.entry(owner).or_default() += 1;
                    }
                }
                Ok(CommandResult::Distribution {
                    samples: *samples,
                    counts,
                })
            }
            Command::Compare { nodes, samples } => {
                let rings: Vec<_> = RingKind::ALL
                    .iter()
                    .map(|kind| build_ring(config, *kind, nodes))
                    .collect();
                let disagreements = (0..*samples)
                    .filter(|i| {
                        let key = sample_key(*i);
                        let first = rings[0].node_of(key.as_bytes());
                        rings[1..].iter().any(|ring| ring.node_of(key.as_bytes()) != first)
                    })
                    .count();
                Ok(CommandResult::Comparison {
                    samples: *samples,
                    disagreements,
                })
            }
            Command::Simulate { key, nodes } => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .context("starting runtime")?;
                runtime.block_on(simulate(config, key, nodes))
            }
        }
    }
}

fn build_ring(config: &GridConfig, kind: RingKind, nodes: &[String]) -> Box<dyn HashRing<NodeId>> {
    RingBuilder::new()
        .with_points_per_node(config.points_per_node)
        .with_hasher(config.hasher())
        .add_nodes(nodes.iter().map(|id| NodeId::new(id.as_str())))
        .build(kind)
}

fn sample_key(i: usize) -> String {
    format!("key-{i}")
}

/// Reports each local delivery as `(delivering node, sender, address)`.
struct SimulatedActors {
    node: NodeId,
    delivered: mpsc::UnboundedSender<(NodeId, NodeId, String)>,
}

impl SimulatedActors {
    fn report(&self, sender: &NodeId, delivery: &Delivery) {
        if self
            .delivered
            .send((self.node.clone(), sender.clone(), delivery.address.clone()))
            .is_err()
        {
            trace!(node = %self.node, address = %delivery.address, "simulation report dropped");
        }
    }
}

#[async_trait]
impl Inbound for SimulatedActors {
    async fn grid_deliver(&self, sender: &NodeId, delivery: Delivery) -> grid::Result<()> {
        self.report(sender, &delivery);
        Ok(())
    }

    async fn actor_deliver(&self, sender: &NodeId, delivery: Delivery) -> grid::Result<()> {
        self.report(sender, &delivery);
        Ok(())
    }

    async fn start(&self, sender: &NodeId, delivery: Delivery) -> grid::Result<()> {
        self.report(sender, &delivery);
        Ok(())
    }

    async fn relocate(
        &self,
        sender: &NodeId,
        delivery: Delivery,
        _pending: Vec<GridMessage>,
    ) -> grid::Result<()> {
        self.report(sender, &delivery);
        Ok(())
    }

    async fn answer(&self, _sender: &NodeId, _answer: Answer) -> grid::Result<()> {
        Ok(())
    }
}

async fn simulate(config: &GridConfig, key: &str, nodes: &[String]) -> anyhow::Result<CommandResult> {
    let ids: Vec<NodeId> = nodes.iter().map(|id| NodeId::new(id.as_str())).collect();
    let network = LoopbackNetwork::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut grids = Vec::with_capacity(ids.len());
    for id in &ids {
        let actors = Arc::new(SimulatedActors {
            node: id.clone(),
            delivered: tx.clone(),
        });
        let grid = Arc::new(Grid::new(
            id.clone(),
            config.clone(),
            network.transport(id.clone()),
            actors,
        )?);
        network.attach(&grid);
        for member in &ids {
            grid.include_node(member.clone());
            grid.inform_node_is_healthy(member, true);
        }
        grids.push(grid);
    }

    let owner = grids
        .first()
        .and_then(|grid| grid.owner_of(key));
    // Enter through a node that does not own the key, if there is one
    let entry = grids
        .iter()
        .find(|grid| Some(grid.local()) != owner.as_ref())
        .or_else(|| grids.first())
        .context("simulation needs at least one node")?;
    info!(key, entry = %entry.local(), "injecting delivery");

    let message = GridMessage::GridDeliver(Delivery::new(key, "Simulated.deliver()", Vec::new()));
    let payload = config.codec.build().encode(&message)?;
    entry.receive(&NodeId::from("client"), &payload);

    tokio::time::sleep(Duration::from_millis(100)).await;
    for grid in &grids {
        grid.shutdown();
    }

    let mut delivered_on = Vec::new();
    while let Ok((node, _sender, _address)) = rx.try_recv() {
        delivered_on.push(node);
    }
    let mut route = vec![(NodeId::from("client"), entry.local().clone())];
    route.extend(network.hops().into_iter().map(|hop| (hop.from, hop.to)));

    Ok(CommandResult::Simulation {
        key: key.to_string(),
        owner,
        route,
        delivered_on,
    })
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Owner { key, owner } => match owner {
                Some(owner) => write!(f, "{key} -> {owner}"),
                None => write!(f, "{key} -> (empty ring)"),
            },
            CommandResult::Distribution { samples, counts } => {
                writeln!(f, "{samples} keys")?;
                for (node, count) in counts {
                    let share = if *samples == 0 {
                        0.0
                    } else {
                        *count as f64 * 100.0 / *samples as f64
                    };
                    writeln!(f, "  {node:<16} {count:>8} {share:>6.2}%")?;
                }
                Ok(())
            }
            CommandResult::Comparison {
                samples,
                disagreements,
            } => write!(
                f,
                "array/list/map disagree on {disagreements} of {samples} keys"
            ),
            CommandResult::Simulation {
                key,
                owner,
                route,
                delivered_on,
            } => {
                match owner {
                    Some(owner) => writeln!(f, "{key} is owned by {owner}")?,
                    None => writeln!(f, "{key} has no owner")?,
                }
                for (from, to) in route {
                    writeln!(f, "  {from} -> {to}")?;
                }
                let delivered: Vec<String> = delivered_on.iter().map(|node| node.to_string()).collect();
                write!(f, "delivered on: [{}]", delivered.join(", "))
            }
        }
    }
}
