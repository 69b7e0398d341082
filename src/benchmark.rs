//! Throughput benchmarks for edit-list construction and assembly
//!
//! Self-contained harness in the same spirit as the criterion benches under
//! `benches/`, usable from the demo binary without a bench runner.

use crate::assemble::AssembleEnv;
use crate::editor::MessageEditor;
use crate::reply::{ReplyKind, ReplyLumpList, ReplyText};
use rayon::prelude::*;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::thread;
use std::time::Instant;

/// Run the full benchmark suite
pub fn run_comprehensive_benchmark() {
    println!(">>>> Running Edit-List Throughput Benchmark <<<<");

    let num_cores = num_cpus::get();
    println!("Running on {} CPU cores", num_cores);

    benchmark_manual_threads(BenchmarkType::EditOnly);
    benchmark_manual_threads(BenchmarkType::EditAndAssemble);
    benchmark_manual_threads(BenchmarkType::ReplyBuild);
    benchmark_rayon_sweep();
}

/// Enum to specify which type of benchmark to run
#[derive(Copy, Clone)]
enum BenchmarkType {
    EditOnly,
    EditAndAssemble,
    ReplyBuild,
}

fn proxy_addr() -> SocketAddr {
    "10.0.0.1:5060".parse().expect("static address parses")
}

/// Queue the representative proxy edit set against one message
fn apply_edit_set(message: &str) -> bool {
    let addr = proxy_addr();
    let mut editor = match MessageEditor::new(message) {
        Ok(editor) => editor,
        Err(_) => return false,
    };
    editor.set_env(AssembleEnv::new().with_send(addr));
    editor.add_via_header("UDP", &addr, "z9hG4bK-bench").is_ok()
        && editor.add_record_route_header(&addr).is_ok()
        && editor.replace_header("Max-Forwards", "69").is_ok()
        && editor.remove_header("User-Agent").is_ok()
}

fn apply_and_assemble(message: &str) -> bool {
    let addr = proxy_addr();
    let mut editor = match MessageEditor::new(message) {
        Ok(editor) => editor,
        Err(_) => return false,
    };
    let ok = editor.add_via_header("UDP", &addr, "z9hG4bK-bench").is_ok()
        && editor.add_record_route_header(&addr).is_ok()
        && editor.replace_header("Max-Forwards", "69").is_ok();
    ok && editor.build().is_ok()
}

fn build_reply() -> bool {
    let mut reply = ReplyLumpList::new();
    let ok = reply
        .add(ReplyText::copied(b"Server: sipedit\r\n"), ReplyKind::Header)
        .is_ok()
        && reply
            .add(
                ReplyText::copied(b"Contact: <sip:10.0.0.1:5060>\r\n"),
                ReplyKind::Header,
            )
            .is_ok()
        && reply
            .add(ReplyText::copied(b"v=0\r\no=bench 0 0 IN IP4 10.0.0.1\r\n"), ReplyKind::Body)
            .is_ok();
    ok && !reply.render_headers().is_empty()
}

/// Benchmark using manual thread creation - one thread per core
fn benchmark_manual_threads(benchmark_type: BenchmarkType) {
    const ITERATIONS_PER_THREAD: usize = 200_000;

    let (title, message) = match benchmark_type {
        BenchmarkType::EditOnly => ("Edit Construction Only", create_simple_sip_message()),
        BenchmarkType::EditAndAssemble => ("Edit + Assembly", create_complex_sip_message()),
        BenchmarkType::ReplyBuild => ("Reply Fragment Construction", String::new()),
    };

    println!("\n--- Benchmark: {} ---", title);

    let num_cores = num_cpus::get();
    let total_iterations = ITERATIONS_PER_THREAD * num_cores;
    println!(
        "Running {} iterations ({} per thread on {} threads)",
        total_iterations, ITERATIONS_PER_THREAD, num_cores
    );

    let message = Arc::new(message);
    let successful_edits = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();

    let mut handles = vec![];
    for _ in 0..num_cores {
        let message_clone = Arc::clone(&message);
        let counter_clone = Arc::clone(&successful_edits);

        let handle = thread::spawn(move || {
            for _ in 0..ITERATIONS_PER_THREAD {
                let ok = match benchmark_type {
                    BenchmarkType::EditOnly => apply_edit_set(&message_clone),
                    BenchmarkType::EditAndAssemble => apply_and_assemble(&message_clone),
                    BenchmarkType::ReplyBuild => build_reply(),
                };
                if ok {
                    counter_clone.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        let _ = handle.join();
    }

    let duration = start.elapsed();
    print_benchmark_results(duration, total_iterations, message.len());
    println!(
        "Successful edit sets: {}",
        successful_edits.load(Ordering::Relaxed)
    );
}

/// Rayon work-stealing sweep over a mixed batch of messages
fn benchmark_rayon_sweep() {
    const BATCH: usize = 400_000;

    println!("\n--- Benchmark: Rayon Mixed Sweep ---");
    let simple = create_simple_sip_message();
    let complex = create_complex_sip_message();

    let start = Instant::now();
    let successful = (0..BATCH)
        .into_par_iter()
        .filter(|i| {
            let message = if i % 2 == 0 { &simple } else { &complex };
            apply_and_assemble(message)
        })
        .count();
    let duration = start.elapsed();

    print_benchmark_results(duration, BATCH, (simple.len() + complex.len()) / 2);
    println!("Successful edit sets: {}", successful);
}

/// Helper function to print benchmark results
fn print_benchmark_results(duration: std::time::Duration, iterations: usize, message_size: usize) {
    println!("Time elapsed: {:?}", duration);
    println!(
        "Edit sets per second: {:.2}",
        iterations as f64 / duration.as_secs_f64()
    );

    let total_bytes = iterations * message_size;
    let throughput_mbps = (total_bytes as f64 / 1_000_000.0) / duration.as_secs_f64();
    println!("Message size: {} bytes", message_size);
    println!("Throughput: {:.2} MB/s", throughput_mbps);
}

/// Create a simple SIP message for benchmarking
pub fn create_simple_sip_message() -> String {
    "INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
Max-Forwards: 70\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 314159 INVITE\r\n\
Contact: <sip:alice@pc33.atlanta.com>\r\n\
User-Agent: SoftPhone/1.0\r\n\
Content-Length: 0\r\n\r\n"
        .to_string()
}

/// Create a more complex SIP message with more headers and a body
pub fn create_complex_sip_message() -> String {
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
Allow: INVITE, ACK, CANCEL, OPTIONS, BYE, REFER, NOTIFY, MESSAGE, SUBSCRIBE, INFO\r\n\
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_set_applies_to_sample_messages() {
        assert!(apply_edit_set(&create_simple_sip_message()));
        assert!(apply_and_assemble(&create_complex_sip_message()));
        assert!(build_reply());
    }
}
