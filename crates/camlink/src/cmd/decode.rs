use std::fs;

use bytes::BytesMut;
use camlink_frame::{decode_packet_from, FrameConfig, Packet};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = fs::read(&args.file)
        .map_err(|err| io_error(&format!("failed reading {}", args.file.display()), err))?;

    let config = FrameConfig {
        image_descriptor: !args.no_descriptor,
        ..FrameConfig::default()
    };
    let (packets, trailing) = decode_all(&bytes, &config)?;
    for packet in &packets {
        print_packet(packet, format);
    }
    tracing::debug!(packets = packets.len(), "dump decoded");

    if trailing > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{trailing} trailing bytes do not form a complete packet"),
        ));
    }
    Ok(SUCCESS)
}

/// Decode every packet in `bytes`, returning them with the count of
/// leftover bytes that end mid-packet.
fn decode_all(bytes: &[u8], config: &FrameConfig) -> CliResult<(Vec<Packet>, usize)> {
    let mut buf = BytesMut::from(bytes);
    let mut packets = Vec::new();
    while let Some(packet) =
        decode_packet_from(&mut buf, config).map_err(|err| frame_error("decode failed", err))?
    {
        packets.push(packet);
    }
    Ok((packets, buf.len()))
}

#[cfg(test)]
mod tests {
    use camlink_frame::{encode_packet, IMAGE, TEXT};

    use super::*;

    #[test]
    fn decodes_mixed_dump() {
        let mut wire = BytesMut::new();
        encode_packet(TEXT, b"hi\r\n", &mut wire);
        Packet::image(0x31, vec![9u8; 20]).encode(&mut wire);
        wire.extend_from_slice(&[0xFF, 0xAA, 0x07]);

        let (packets, trailing) = decode_all(&wire, &FrameConfig::default()).unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[1].msg_type, IMAGE);
        assert_eq!(packets[1].descriptor, Some(0x31));
        assert_eq!(trailing, 3);
    }

    #[test]
    fn garbage_is_invalid_data() {
        let err = decode_all(b"not a packet", &FrameConfig::default()).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }
}
