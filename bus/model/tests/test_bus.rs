// Licensed under the Apache-2.0 license

use anyhow::Result;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::sync::Arc;
use wbgen_bus::{
    Adapter, BusInfo, BusScripter, Interconnect, NodeInfo, NodeShape, Topology, WbBus, WbBusDesc,
    WbMaster, WbMasterDesc, WbNode, WbSlave, WbSlaveDesc,
};
use wbgen_common::{
    Address, AddressConflictError, AddressRange, Error, ErrorKind, StructuralError,
};
use wbgen_registers::types::{BitRange, FieldFunction, FieldType, RegType};
use wbgen_registers::{
    FieldDesc, FieldInfo, RegisterDesc, RegisterInfo, RegisterScripter, RegisterSet,
    RegisterSetDesc, RegisterSetInfo,
};

fn setup() {
    // Initialize log level to info (only once)
    let _ = SimpleLogger::new().with_level(LevelFilter::Info).init();
}

#[test]
fn test_narrow_slave_needs_adapter() -> Result<()> {
    setup();
    let bus = WbBus::new(
        WbBusDesc::new("bus")
            .master(WbMasterDesc::new("cpu", 32, 8, 16))
            .slave(WbSlaveDesc::new("uart", 8, 8, 4, Address::Auto)),
    )?;

    let uart = bus.slave("uart").unwrap();
    assert_eq!(uart.base_address(), 0);
    assert_eq!(uart.window(), AddressRange::new(0, 0x40));
    assert_eq!(
        bus.adapter(uart),
        Some(Adapter {
            node: NodeShape::new(8, 8, 4),
            bus: NodeShape::new(32, 8, 16),
        })
    );
    assert_eq!(bus.adapter(bus.master("cpu").unwrap()), None);
    assert!(matches!(bus.interconnect(), Interconnect::Direct { .. }));
    Ok(())
}

#[test]
fn test_overlapping_slaves() {
    setup();
    let desc = WbBusDesc::new("bus")
        .master(WbMasterDesc::new("cpu", 32, 8, 16))
        .slave(WbSlaveDesc::new("ram", 32, 8, 4, 0x0))
        .slave(WbSlaveDesc::new("rom", 32, 8, 4, 0x20));

    let err = WbBus::new(desc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AddressConflict);
    match err {
        Error::AddressConflict(AddressConflictError::Overlap {
            path,
            range,
            other,
            other_range,
        }) => {
            assert_eq!(path.to_string(), "bus.rom");
            assert_eq!(other.to_string(), "bus.ram");
            assert_eq!(range, AddressRange::new(0x20, 0x40));
            assert_eq!(other_range, AddressRange::new(0x0, 0x40));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_oversized_address_is_an_error() {
    setup();
    let err = WbBus::new(
        WbBusDesc::new("bus")
            .master(WbMasterDesc::new("cpu", 32, 8, 16))
            .slave(WbSlaveDesc::new("ram", 32, 8, u32::MAX, Address::Auto)),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Structural(StructuralError::InvalidAddressSize { .. })
    ));
    assert_eq!(err.path().unwrap().to_string(), "bus.ram");

    // fits the slave's own byte addressing but not the wider bus format
    let err = WbBus::new(
        WbBusDesc::new("bus")
            .master(WbMasterDesc::new("cpu", 64, 8, 16))
            .slave(WbSlaveDesc::new("ram", 8, 8, 63, Address::Auto)),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AddressConflict);
}

#[test]
fn test_slaves_are_aligned_and_disjoint() -> Result<()> {
    setup();
    let mut desc = WbBusDesc::new("bus").master(WbMasterDesc::new("cpu", 64, 8, 20));
    for i in 0..12u32 {
        let base = if i % 4 == 0 {
            Address::Explicit(0x1000 * u64::from(i))
        } else {
            Address::Auto
        };
        desc = desc.slave(WbSlaveDesc::new(&format!("dev{i}"), 8 << (i % 4), 8, 2 + i % 5, base));
    }
    let bus = WbBus::new(desc)?;

    let slaves = bus.slaves();
    assert!(slaves.iter().all(|s| s.base_address() % 8 == 0));
    for (i, a) in slaves.iter().enumerate() {
        for b in &slaves[i + 1..] {
            assert!(!a.window().overlaps(&b.window()), "{} {}", a.name(), b.name());
        }
    }
    assert_eq!(bus.slave("dev8").unwrap().base_address(), 0x8000);
    Ok(())
}

#[test]
fn test_resolution_is_deterministic() -> Result<()> {
    setup();
    let desc = || {
        WbBusDesc::new("bus")
            .master(WbMasterDesc::new("cpu", 32, 8, 16))
            .master(WbMasterDesc::new("dma", 16, 8, 16))
            .slave(WbSlaveDesc::new("ram", 32, 8, 8, Address::Auto))
            .slave(WbSlaveDesc::new("uart", 8, 8, 3, Address::Auto))
            .topology(Topology::Crossbar)
    };
    let first = WbBus::new(desc())?;
    let second = WbBus::new(desc())?;
    assert_eq!(first.model, second.model);
    Ok(())
}

#[test]
fn test_crossbar_from_toml() -> Result<()> {
    setup();
    let desc = WbBusDesc::from_toml_str(
        r#"
name = "soc"
topology = "Crossbar"

[[masters]]
name = "cpu"
port_size = 32
granularity = 8
address_size = 10

[[masters]]
name = "dma"
port_size = 32
granularity = 8
address_size = 4

[[slaves]]
name = "ram"
port_size = 32
granularity = 8
address_size = 4
base_address = 0x0

[[slaves]]
name = "uart"
port_size = 8
granularity = 8
address_size = 3
base_address = "auto"
"#,
    )?;
    let bus = WbBus::new(desc)?;
    assert_eq!(bus.topology(), Topology::Crossbar);
    assert_eq!(bus.slave("uart").unwrap().window(), AddressRange::new(0x40, 0x20));

    match bus.interconnect() {
        Interconnect::Crossbar { slaves, grants, .. } => {
            assert_eq!(slaves, &["ram", "uart"]);
            assert_eq!(grants, &[vec![true, true], vec![true, false]]);
        }
        other => panic!("unexpected interconnect {other:?}"),
    }
    assert_eq!(bus.interconnect().decode("cpu", 0x44), Some("uart"));
    assert_eq!(bus.interconnect().decode("dma", 0x44), None);
    Ok(())
}

#[test]
fn test_unknown_toml_key() {
    let err = WbBusDesc::from_toml_str("name = \"bus\"\nspeed = 3").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Description);
}

/// Counts registers and remembers the word address of the first one.
#[derive(Default)]
struct FirstWord {
    registers: usize,
    first_word: Option<u64>,
    base: u64,
}

impl RegisterScripter for FirstWord {
    fn begin_register_set(&mut self, set: &RegisterSetInfo<'_>) {
        self.base = set.base_address;
    }

    fn begin_register(&mut self, register: &RegisterInfo<'_>) {
        self.registers += 1;
        self.first_word.get_or_insert(register.word_address);
    }

    fn begin_field(&mut self, _field: &FieldInfo<'_>) {}
}

#[test]
fn test_register_set_slave() -> Result<()> {
    setup();
    let mut regs = RegisterSetDesc::new("PWM Generator", 16);
    for name in ["period", "duty", "phase", "control", "status"] {
        regs = regs.register(
            RegisterDesc::new(name, RegType::WriteRead).field(
                FieldDesc::new("value", BitRange::new(15, 0), FieldType::Unsigned16Bit)
                    .functions(FieldFunction::Read | FieldFunction::Overwrite),
            ),
        );
    }
    let regs = Arc::new(RegisterSet::new(regs)?.into_model());

    let bus = WbBus::new(
        WbBusDesc::new("bus")
            .master(WbMasterDesc::new("cpu", 32, 8, 16))
            .master(WbMasterDesc::new("debug", 8, 8, 16))
            .slave(WbSlaveDesc::new("ram", 32, 8, 6, 0x0))
            .slave(WbSlaveDesc::from_register_set(regs.clone())),
    )?;

    let pwm = bus.slave("PWM Generator").unwrap();
    assert_eq!(pwm.shape(), NodeShape::new(16, 8, 3));
    // 2^(3 + 2) bytes after the 256-byte RAM window
    assert_eq!(pwm.window(), AddressRange::new(0x100, 0x20));
    assert!(Arc::ptr_eq(pwm.register_set().unwrap(), &regs));

    let debug = bus.master("debug").unwrap();
    assert_eq!(debug.address_shift(), 2);
    let options = pwm.walk_options(debug);
    assert_eq!(options.base_address, Some(0x100));
    assert_eq!(options.address_shift, 2);

    let mut scripter = FirstWord::default();
    pwm.register_set().unwrap().walk(&options, &mut scripter)?;
    assert_eq!(scripter.registers, 5);
    assert_eq!(scripter.base, 0x100);
    // byte address 0x100 is word 0x80 of the 16-bit set, shifted right twice
    assert_eq!(scripter.first_word, Some(0x20));
    Ok(())
}

#[derive(Default)]
struct RecordingScripter {
    calls: Vec<String>,
}

impl BusScripter for RecordingScripter {
    fn begin_bus(&mut self, bus: &BusInfo<'_>) {
        self.calls.push(format!(
            "bus {} {} [{}] lo={}",
            bus.name, bus.topology, bus.format, bus.address_lo
        ));
    }

    fn master(&mut self, master: &NodeInfo<'_, WbMaster>) {
        self.calls.push(format!(
            "master {} shift={} adapter={}",
            master.node.name(),
            master.node.address_shift(),
            master.adapter.is_some()
        ));
    }

    fn slave(&mut self, slave: &NodeInfo<'_, WbSlave>) {
        self.calls.push(format!(
            "slave {} {} adapter={}",
            slave.node.name(),
            slave.node.window(),
            slave.adapter.is_some()
        ));
    }

    fn end_bus(&mut self) {
        self.calls.push("end_bus".into());
    }
}

#[test]
fn test_walk_complex_bus() -> Result<()> {
    setup();
    let bus = WbBus::new(
        WbBusDesc::new("Complex Bus")
            .master(WbMasterDesc::new("MCU", 32, 8, 16))
            .master(WbMasterDesc::new("Debug", 8, 8, 24))
            .slave(WbSlaveDesc::new("User Interface", 8, 8, 5, 0x100))
            .slave(WbSlaveDesc::new("I/O Expander", 32, 8, 3, Address::Auto))
            .slave(WbSlaveDesc::new("PWM Generator", 16, 8, 3, Address::Auto)),
    )?;

    let mut scripter = RecordingScripter::default();
    bus.walk(&mut scripter);
    assert_eq!(
        scripter.calls,
        [
            "bus Complex Bus SharedBus [32/8 bit, 24 address bits] lo=2",
            "master MCU shift=0 adapter=false",
            "master Debug shift=2 adapter=true",
            "slave User Interface [0x00000100, 0x0000017F] adapter=true",
            "slave I/O Expander [0x00000180, 0x0000019F] adapter=false",
            "slave PWM Generator [0x000001A0, 0x000001BF] adapter=true",
            "end_bus",
        ]
    );
    Ok(())
}
