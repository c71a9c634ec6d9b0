//! End-to-end estimates for the demo keyword-spotting graph.

use std::path::PathBuf;

use mcu_budget::estimate::{estimate_ram_rescan, plan_memory, DeviceBudget, Report};
use mcu_budget::ir::validate_sequential;
use mcu_budget::parse::json;
use mcu_budget::{estimate_ram, estimate_rom};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../demos")
        .join(name)
}

#[test]
fn micro_kws_estimates() {
    let graph = json::graph_from_path(demo("micro_kws.json")).unwrap();
    validate_sequential(graph.tensors(), graph.layers()).unwrap();

    // reshape shape + dw kernel/bias + flatten shape + dense weights/bias
    assert_eq!(estimate_rom(graph.tensors()).unwrap(), 16 + 80 + 16 + 8 + 2000 + 16);

    // flatten reshape holds [1,25,5,4] and [1,500] at once
    assert_eq!(estimate_ram(graph.tensors(), graph.layers()).unwrap(), 1000);
    assert_eq!(
        estimate_ram_rescan(graph.tensors(), graph.layers()).unwrap(),
        1000
    );

    let plan = plan_memory(graph.tensors(), graph.layers()).unwrap();
    let live: Vec<usize> = plan.layers.iter().map(|l| l.live_bytes).collect();
    assert_eq!(live, vec![980, 990, 1000, 504, 8]);
    assert_eq!(plan.peak_layer, Some(2));
}

#[test]
fn micro_kws_report() {
    let graph = json::graph_from_path(demo("micro_kws.json")).unwrap();
    let report = Report::build(&graph).unwrap();

    let macs: Vec<u64> = report.layers.iter().map(|l| l.macs).collect();
    // depthwise: 25*5 positions * 1 channel * 5x4 kernel * 4; dense: 500 * 4
    assert_eq!(macs, vec![0, 10_000, 0, 2_000, 0]);
    assert_eq!(report.total_macs, 12_000);

    let budget = json::budget_from_path(demo("esp32s3.json")).unwrap();
    let check = report.check(&budget);
    assert!(check.fits(), "{check}");
    assert_eq!(check.ram.unwrap().headroom, 32768 - 1000);

    let tight = DeviceBudget {
        name: "tight".into(),
        rom_bytes: Some(2048),
        ram_bytes: None,
    };
    let check = report.check(&tight);
    assert!(!check.fits());
    assert_eq!(check.rom.unwrap().headroom, 2048 - 2136);
}

#[test]
fn micro_kws_report_serializes() {
    let graph = json::graph_from_path(demo("micro_kws.json")).unwrap();
    let report = Report::build(&graph).unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["ram_bytes"], 1000);
    assert_eq!(value["layers"][1]["op"], "depthwise_conv2d");
    assert_eq!(value["memory"][2]["live"], serde_json::json!([5, 7]));
}
