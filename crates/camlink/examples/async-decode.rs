//! Decode a captured reply dump with the async codec.
//!
//! Run with:
//!   cargo run --example async-decode --features async -- replies.bin

use camlink::frame::{msg_type_name, PacketCodec};
use futures_util::StreamExt;
use tokio_util::codec::FramedRead;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: async-decode <FILE>")?;
    let bytes = std::fs::read(&path)?;

    let mut packets = FramedRead::new(bytes.as_slice(), PacketCodec::default());
    let mut count = 0usize;
    while let Some(packet) = packets.next().await {
        let packet = packet?;
        count += 1;
        println!(
            "{:>4}  {:<16} {:>8} bytes",
            count,
            msg_type_name(packet.msg_type),
            packet.payload.len()
        );
    }
    eprintln!("{count} packets in {path}");
    Ok(())
}
