use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sipedit::*;
use std::net::SocketAddr;

fn sample_invite() -> String {
    "INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
Via: SIP/2.0/TCP server10.biloxi.com;branch=z9hG4bK776asdhds;received=192.0.2.3\r\n\
Max-Forwards: 70\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 314159 INVITE\r\n\
Contact: <sip:alice@pc33.atlanta.com>\r\n\
User-Agent: SoftPhone/1.0\r\n\
Content-Type: application/sdp\r\n\
Content-Length: 158\r\n\r\n\
v=0\r\n\
o=alice 2890844526 2890844526 IN IP4 pc33.atlanta.com\r\n\
s=Session SDP\r\n\
c=IN IP4 pc33.atlanta.com\r\n\
t=0 0\r\n\
m=audio 49170 RTP/AVP 0\r\n\
a=rtpmap:0 PCMU/8000\r\n"
        .to_string()
}

/// Benchmark raw lump-chain construction: ordered deletes plus side-chains
fn bench_lump_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("lump_construction");

    group.bench_function("mark_delete_ordered_64", |b| {
        b.iter(|| {
            let mut list = LumpList::new();
            for i in 0..64usize {
                // Offsets arrive out of order, the chain keeps them sorted
                let offset = (i * 37) % 997;
                list.mark_delete(black_box(offset), 4, 0).unwrap();
            }
            black_box(list.lump_count())
        })
    });

    group.bench_function("anchor_with_side_chains", |b| {
        b.iter(|| {
            let mut list = LumpList::new();
            let anchor = list.mark_anchor(black_box(128), 0, 0).unwrap();
            for _ in 0..16 {
                list.insert_before(anchor, b"Record-Route: <sip:p;lr>\r\n".to_vec(), 0)
                    .unwrap();
                list.insert_after(anchor, b";received=10.0.0.1".to_vec(), 0)
                    .unwrap();
            }
            black_box(list.clear())
        })
    });

    group.finish();
}

/// Benchmark the full proxy edit pass: scan, queue edits, assemble
fn bench_editor_pass(c: &mut Criterion) {
    let invite = sample_invite();
    let addr: SocketAddr = "10.0.0.1:5060".parse().unwrap();

    let mut group = c.benchmark_group("editor_pass");
    group.throughput(Throughput::Bytes(invite.len() as u64));

    group.bench_function("edit_only", |b| {
        b.iter(|| {
            let mut editor = MessageEditor::new(black_box(&invite)).unwrap();
            editor.add_via_header("UDP", &addr, "z9hG4bK-bench").unwrap();
            editor.add_record_route_header(&addr).unwrap();
            editor.replace_header("Max-Forwards", "69").unwrap();
            black_box(editor.lumps().lump_count())
        })
    });

    group.bench_function("edit_and_assemble", |b| {
        b.iter(|| {
            let mut editor = MessageEditor::new(black_box(&invite)).unwrap();
            editor.add_via_header("UDP", &addr, "z9hG4bK-bench").unwrap();
            editor.add_record_route_header(&addr).unwrap();
            editor.replace_header("Max-Forwards", "69").unwrap();
            editor.remove_header("User-Agent").unwrap();
            black_box(editor.build().unwrap())
        })
    });

    group.finish();
}

/// Benchmark reply fragment accumulation and rendering
fn bench_reply_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("reply_list");

    group.bench_function("add_and_render", |b| {
        b.iter(|| {
            let mut reply = ReplyLumpList::new();
            for _ in 0..8 {
                reply
                    .add(
                        ReplyText::copied(b"Warning: 399 proxy \"bench\"\r\n"),
                        ReplyKind::Header,
                    )
                    .unwrap();
            }
            reply
                .add(ReplyText::copied(b"bench body"), ReplyKind::Body)
                .unwrap();
            black_box(reply.render_headers())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_lump_construction,
    bench_editor_pass,
    bench_reply_list
);
criterion_main!(benches);
