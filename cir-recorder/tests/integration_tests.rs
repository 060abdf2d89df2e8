use std::{sync::atomic::Ordering, time::Duration};

use cir_core::{load_record, record_size};
use cir_hal::{SimEvent, SimulatedDevice};
use cir_recorder::{CaptureConfig, CapturePipeline};
use cir_types::{Prf, SysStatus, CIR_SAMPLES_PRF16};
use tempfile::tempdir;

fn quick_config(
    dir: &std::path::Path,
    max: u32,
) -> CaptureConfig {
    CaptureConfig {
        experiment: "exp".to_string(),
        output_dir: dir.to_path_buf(),
        max_captures: Some(max),
        rx_timeout: Some(Duration::from_millis(20)),
        progress_every: 0,
        ..CaptureConfig::default()
    }
}

#[test]
fn test_session_with_mixed_events() {
    let dir = tempdir().unwrap();
    let (pipeline, metrics) = CapturePipeline::new(quick_config(dir.path(), 3));

    let mut device = SimulatedDevice::scripted([
        SimEvent::radar(-1, 0xFF_FFFF_FFFF),
        SimEvent::RxError(SysStatus::RXPHE | SysStatus::RXSFDTO),
        SimEvent::Frame {
            payload: vec![0; 40],
            rx_timestamp: 5,
            first_path: 0,
        },
        SimEvent::radar(2, 200),
        SimEvent::Silence,
    ]);
    // после тишины снова пойдут кадры
    device.generate = true;

    let captured = pipeline.run(&mut device).unwrap();
    assert_eq!(captured, 3);

    assert_eq!(metrics.frames_recorded.load(Ordering::Relaxed), 3);
    assert_eq!(metrics.rx_errors.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.oversized_frames.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.rx_timeouts.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.write_errors.load(Ordering::Relaxed), 0);

    let first = load_record(&dir.path().join("exp_-1_cir.bin")).unwrap();
    assert_eq!(first.frame_number, -1);
    assert_eq!(first.rx_timestamp, 0xFF_FFFF_FFFF);

    let second = load_record(&dir.path().join("exp_2_cir.bin")).unwrap();
    assert_eq!(second.rx_timestamp, 200);
}

#[test]
fn test_prf16_records_are_smaller() {
    let dir = tempdir().unwrap();
    let mut config = quick_config(dir.path(), 2);
    config.radio.prf = Prf::Mhz16;
    config.radio.tx_preamble_code = 4;
    config.radio.rx_preamble_code = 4;

    let (pipeline, _metrics) = CapturePipeline::new(config);
    let mut device = SimulatedDevice::new();
    assert_eq!(pipeline.run(&mut device).unwrap(), 2);

    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let path = entry.unwrap().path();
        let len = std::fs::metadata(&path).unwrap().len() as usize;
        assert_eq!(len, record_size(CIR_SAMPLES_PRF16));
        assert_eq!(load_record(&path).unwrap().sample_count(), CIR_SAMPLES_PRF16);
    }
}

#[test]
fn test_same_frame_number_overwrites() {
    let dir = tempdir().unwrap();
    let (pipeline, _metrics) = CapturePipeline::new(quick_config(dir.path(), 2));

    let mut device = SimulatedDevice::scripted([SimEvent::radar(8, 1), SimEvent::radar(8, 2)]);
    assert_eq!(pipeline.run(&mut device).unwrap(), 2);

    let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
    assert_eq!(load_record(&dir.path().join("exp_8_cir.bin")).unwrap().rx_timestamp, 2);
}
