//! Simple motor command subscriber, prints every command the exec publishes

use comms_if::{
    eqpt::motor::MotorCmd,
    net::{topic, MonitoredSocket, SocketOptions},
};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "test_motor_sub", about = "Print motor commands")]
struct Opt {
    /// Endpoint the exec publishes commands on
    #[structopt(long, default_value = "tcp://localhost:5011")]
    endpoint: String,

    /// Topic the commands are published on
    #[structopt(long, default_value = "/xycar_motor")]
    topic: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    // Create context
    let ctx = zmq::Context::new();

    // Create socket
    let socket = MonitoredSocket::new(
        &ctx,
        zmq::SUB,
        SocketOptions::default(),
        &opt.endpoint
    )?;

    // Only the motor topic
    socket.set_subscribe(opt.topic.as_bytes())?;

    // Recieve messages from publisher
    loop {
        let msg = socket.recv_msg(0)?;

        match msg.as_str().map(|s| topic::decode::<MotorCmd>(&opt.topic, s)) {
            Some(Ok(cmd)) => println!("angle: {:4}, speed: {:3}", cmd.angle, cmd.speed),
            Some(Err(e)) => println!("Bad message: {}", e),
            None => println!("Non UTF-8 message")
        }
    }
}
