extern crate clap;
extern crate mpeg2pes;
#[macro_use]
extern crate trackable;

use clap::{App, Arg};
use mpeg2pes::pes::PesPacketParser;
use std::io::{Read, Write};
use trackable::error::Failure;

fn main() {
    let matches = App::new("parse")
        .arg(
            Arg::with_name("OUTPUT_TYPE")
                .long("output-type")
                .short("o")
                .takes_value(true)
                .possible_values(&["header", "payload"])
                .default_value("header"),
        )
        .arg(
            Arg::with_name("CONTINUATION")
                .long("continuation")
                .short("c")
                .takes_value(false),
        )
        .get_matches();
    let has_start_indicator = !matches.is_present("CONTINUATION");

    let mut bytes = Vec::new();
    track_try_unwrap!(std::io::stdin()
        .read_to_end(&mut bytes)
        .map_err(Failure::from_error));

    let mut parser = PesPacketParser::new(Vec::new());
    let parsed = track_try_unwrap!(parser.parse(&bytes, has_start_indicator));
    match matches.value_of("OUTPUT_TYPE").unwrap() {
        "header" => {
            if let Some(header) = parsed.header {
                println!("{:?}", header);
                println!(
                    "audio={} video={} pts={:?} dts={:?}",
                    header.stream_id.is_audio(),
                    header.stream_id.is_video(),
                    header.pts().map(|t| t.to_duration()),
                    header.dts().map(|t| t.to_duration())
                );
            }
            println!(
                "header_len={} forwarded={} discarded={}",
                parsed.header_len, parsed.forwarded, parsed.discarded
            );
        }
        "payload" => {
            track_try_unwrap!(std::io::stdout()
                .write_all(parser.sink())
                .map_err(Failure::from_error));
        }
        _ => unreachable!(),
    }
}
