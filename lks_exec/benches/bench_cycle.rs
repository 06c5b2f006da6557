//! # Control Cycle Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::eqpt::{
    cam::{ImageMsg, PixelEncoding},
    motor::MotorCmd
};
use lks_lib::{
    cycle::{run_cycle, CmdSink},
    frame_buffer::FrameBuffer,
    lane_ctrl::{self, LaneCtrl},
    lane_det::{self, RowScanDetector}
};
use util::module::State;

/// Sink that discards every command.
struct NullSink;

impl CmdSink for NullSink {
    type Error = std::convert::Infallible;

    fn send(&mut self, cmd: &MotorCmd) -> Result<(), Self::Error> {
        black_box(cmd);
        Ok(())
    }
}

/// 640x480 RGB frame with two white lane markings.
fn lane_image(width: u32, height: u32) -> ImageMsg {
    let step = width * 3;
    let mut data = vec![40u8; (step * height) as usize];

    for y in 0..height {
        for x in (150..160).chain(480..490) {
            let i = (y * step + x * 3) as usize;
            data[i..i + 3].copy_from_slice(&[255, 255, 255]);
        }
    }

    ImageMsg {
        width,
        height,
        step,
        encoding: PixelEncoding::Rgb8,
        data
    }
}

fn cycle_benchmark(c: &mut Criterion) {
    // ---- Build the modules ----

    let params: lane_ctrl::Params = util::params::load_str(r#"
[xycar]
start_speed = 5.0
min_speed = 5.0
max_speed = 15.0
speed_control_threshold = 10.0
acceleration_step = 0.5
deceleration_step = 1.0

[stanley]
k_gain = 1.0
look_ahead_distance = 20.0

[pid]
p_gain = 0.4
i_gain = 0.0
d_gain = 0.05

[moving_average_filter]
sample_size = 10
"#).unwrap();

    let mut ctrl = LaneCtrl::init(lane_ctrl::InitData {
        params,
        cycle_period_s: 1.0 / 33.0
    }).unwrap();

    let mut detector = RowScanDetector::new(lane_det::Params {
        scan_row_ratio: 0.75,
        threshold: 160,
        min_run_px: 4
    });

    let msg = lane_image(640, 480);
    let mut frame_buffer = FrameBuffer::new();
    let mut sink = NullSink;

    // ---- Benchmarks ----

    c.bench_function("frame intake 640x480", |b| {
        b.iter(|| frame_buffer.intake(black_box(&msg)).unwrap())
    });

    c.bench_function("control cycle 640x480", |b| {
        b.iter(|| run_cycle(&mut ctrl, &frame_buffer, &mut detector, &mut sink).unwrap())
    });
}

criterion_group!(benches, cycle_benchmark);
criterion_main!(benches);
