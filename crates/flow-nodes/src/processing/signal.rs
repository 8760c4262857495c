//! Power level conversions between watt and dBm

use std::collections::HashMap;

use flow_engine::{FlowError, Node, NodeProcessor, Outputs, PortDataType, Result};
use serde_json::{json, Value};

use crate::values::take_f64;

/// Linear power in watt to decibel-milliwatt
pub struct WattToDbm;

impl WattToDbm {
    pub const KEY: &'static str = "watt-to-dbm";
    const NAME: &'static str = "Watt to dBm";

    pub fn node() -> Node {
        Node::new(Self::NAME, WattToDbm)
            .with_input("watt", Some(json!(0.001)))
            .with_output("dBm", Some(PortDataType::Float))
    }
}

impl NodeProcessor for WattToDbm {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let watt = take_f64(&mut inputs, Self::NAME, "watt")?;
        if watt <= 0.0 {
            return Err(FlowError::failed(format!(
                "{}: power must be positive, got {} W",
                Self::NAME,
                watt
            )));
        }
        outputs.push("dBm", 10.0 * (1e3 * watt).log10())
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: WattToDbm::KEY,
    factory: WattToDbm::node,
});

/// Decibel-milliwatt to linear power in watt
pub struct DbmToWatt;

impl DbmToWatt {
    pub const KEY: &'static str = "dbm-to-watt";
    const NAME: &'static str = "dBm to Watt";

    pub fn node() -> Node {
        Node::new(Self::NAME, DbmToWatt)
            .with_input("dBm", Some(json!(0.0)))
            .with_output("watt", Some(PortDataType::Float))
    }
}

impl NodeProcessor for DbmToWatt {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let dbm = take_f64(&mut inputs, Self::NAME, "dBm")?;
        outputs.push("watt", 1e-3 * 10f64.powf(dbm / 10.0))
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: DbmToWatt::KEY,
    factory: DbmToWatt::node,
});
