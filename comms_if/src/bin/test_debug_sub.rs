//! Debug frame viewer, writes every annotated frame the exec publishes into a directory

use std::path::PathBuf;

use comms_if::{
    eqpt::cam::{DebugFrame, DEBUG_TOPIC},
    net::{topic, MonitoredSocket, SocketOptions},
};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "test_debug_sub", about = "Save debug frames to disk")]
struct Opt {
    /// Endpoint the exec publishes debug frames on
    #[structopt(long, default_value = "tcp://localhost:5012")]
    endpoint: String,

    /// Directory to write the frames into
    #[structopt(long, parse(from_os_str), default_value = "debug_frames")]
    out_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    std::fs::create_dir_all(&opt.out_dir)?;

    let ctx = zmq::Context::new();
    let socket = MonitoredSocket::new(
        &ctx,
        zmq::SUB,
        SocketOptions {
            recv_hwm: 1,
            ..Default::default()
        },
        &opt.endpoint
    )?;
    socket.set_subscribe(DEBUG_TOPIC.as_bytes())?;

    loop {
        let msg = socket.recv_msg(0)?;
        let frame: DebugFrame = match msg.as_str().map(|s| topic::decode(DEBUG_TOPIC, s)) {
            Some(Ok(f)) => f,
            Some(Err(e)) => {
                println!("Bad debug frame: {}", e);
                continue
            },
            None => continue
        };

        let image = frame.frame.to_cam_image()?;
        let path = opt.out_dir.join(format!("{}.jpg", frame.frame.timestamp.timestamp_millis()));
        image.image.save(&path)?;

        println!(
            "lpos: {:7.1}, rpos: {:7.1}, mpos: {:7.1} -> {:?}",
            frame.left_x, frame.right_x, frame.estimated_x, path
        );
    }
}
