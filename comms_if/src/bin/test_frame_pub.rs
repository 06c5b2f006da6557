//! Synthetic camera publisher
//!
//! Publishes RGB frames showing two bright lane markings on a dark road. The lane centre sways
//! sinusoidally so the lane keeping exec has something to steer against.

use comms_if::{
    eqpt::cam::{ImageMsg, PixelEncoding},
    net::{topic, MonitoredSocket, SocketOptions},
};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "test_frame_pub", about = "Publish synthetic lane frames")]
struct Opt {
    /// Endpoint to bind the publisher to
    #[structopt(long, default_value = "tcp://*:5010")]
    endpoint: String,

    /// Topic to publish frames on
    #[structopt(long, default_value = "/usb_cam/image_raw")]
    topic: String,

    /// Frame width in pixels
    #[structopt(long, default_value = "640")]
    width: u32,

    /// Frame height in pixels
    #[structopt(long, default_value = "480")]
    height: u32,

    /// Distance between the two lane markings in pixels
    #[structopt(long, default_value = "400")]
    lane_width: u32,

    /// Amplitude of the lane centre sway in pixels
    #[structopt(long, default_value = "60")]
    sway: f64,

    /// Publishing rate in Hz
    #[structopt(long, default_value = "30")]
    rate: f64,
}

/// Width of a painted marking in pixels
const MARKING_WIDTH_PX: u32 = 8;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    // Create zmq context
    let ctx = zmq::Context::new();

    // Create socket options
    let socket_options = SocketOptions {
        bind: true,
        block_on_first_connect: false,
        send_hwm: 1,
        ..Default::default()
    };

    // Create the socket
    let socket = MonitoredSocket::new(
        &ctx,
        zmq::PUB,
        socket_options,
        &opt.endpoint
    )?;

    println!("Publishing {}x{} frames on {} ({})", opt.width, opt.height, opt.endpoint, opt.topic);

    let mut t = 0f64;
    loop {
        let centre = opt.width as f64 / 2.0 + opt.sway * (t * 0.5).sin();
        let msg = synth_frame(opt.width, opt.height, centre, opt.lane_width);

        match topic::encode(&opt.topic, &msg) {
            Ok(s) => {
                if let Err(e) = socket.send(&s, 0) {
                    println!("Failed to send frame: {}", e)
                }
            },
            Err(e) => println!("Failed to encode frame: {}", e)
        }

        t += 1.0 / opt.rate;
        std::thread::sleep(std::time::Duration::from_secs_f64(1.0 / opt.rate));
    }
}

/// Build an RGB frame with markings either side of `centre`.
fn synth_frame(width: u32, height: u32, centre: f64, lane_width: u32) -> ImageMsg {
    let step = width * 3;
    let mut data = vec![40u8; (step * height) as usize];

    let half = lane_width as f64 / 2.0;
    let markings = [centre - half, centre + half];

    for row in 0..height {
        for x in markings.iter() {
            let start = (x.round() as i64 - (MARKING_WIDTH_PX / 2) as i64).max(0) as u32;
            for col in start..(start + MARKING_WIDTH_PX).min(width) {
                let i = (row * step + col * 3) as usize;
                data[i..i + 3].copy_from_slice(&[230, 230, 230]);
            }
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
