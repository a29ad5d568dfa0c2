use criterion::{criterion_group, criterion_main, Criterion};

use wwivnet::model::types::MainType;
use wwivnet::packet::{write_wwivnet_packet, NetHeader, NetMailFile, ParsedNetPacketText};

fn sample_text(i: usize) -> ParsedNetPacketText {
    let mut text = ParsedNetPacketText::new(MainType::NewPost);
    text.subtype = "GENCHAT".into();
    text.title = format!("Title{i}").into();
    text.sender = "SYSOP #1 @1".into();
    text.date = "Mon Jan 02 15:04:05 2006".into();
    text.text = "Lorem ipsum dolor sit amet.\r\n".repeat(20).into();
    text
}

fn bench_iterate_packet_file(c: &mut Criterion) {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bench.net");
    for i in 0..1000 {
        let packet = sample_text(i)
            .to_packet(NetHeader::default(), Vec::new())
            .unwrap();
        write_wwivnet_packet(&path, &packet).unwrap();
    }

    c.bench_function("iterate_1000_packets", |b| {
        b.iter(|| NetMailFile::open(&path).unwrap().count())
    });
}

fn bench_parse_text(c: &mut Criterion) {
    let bytes = sample_text(1).to_packet_text();

    c.bench_function("parse_new_post_text", |b| {
        b.iter(|| ParsedNetPacketText::from_text(MainType::NewPost, &bytes))
    });
}

criterion_group!(benches, bench_iterate_packet_file, bench_parse_text);
criterion_main!(benches);
