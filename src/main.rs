//! Demo driver for the sipedit editing core
//!
//! Applies a representative proxy edit set to a sample INVITE and prints
//! the result; `--benchmark` runs the throughput harness instead.

use sipedit::benchmark::{create_simple_sip_message, run_comprehensive_benchmark};
use sipedit::{
    AssembleEnv, EditResult, MessageEditor, ReplyKind, ReplyLumpList, ReplyText,
};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "--benchmark") {
        run_comprehensive_benchmark();
        return;
    }

    if let Err(err) = run_demo() {
        eprintln!("demo failed: {}", err);
        std::process::exit(1);
    }
}

fn run_demo() -> EditResult<()> {
    let addr: SocketAddr = "10.0.0.1:5060"
        .parse()
        .map_err(|_| sipedit::EditError::state_error("demo", "bad demo address"))?;
    let original = create_simple_sip_message();

    println!("=== Original message ===\n{}", original);

    let mut editor = MessageEditor::new(&original)?;
    editor.set_env(AssembleEnv::new().with_send(addr));
    editor.add_via_header("UDP", &addr, "z9hG4bK-demo1")?;
    editor.add_record_route_header(&addr)?;
    editor.replace_header("Max-Forwards", "69")?;
    editor.remove_header("User-Agent")?;

    let edited = editor.build()?;
    println!("=== Edited message ({} lumps) ===\n{}", editor.lumps().lump_count(), edited);

    // A locally generated reply built from fragments
    let mut reply = ReplyLumpList::new();
    reply.add(
        ReplyText::copied(b"Server: sipedit-demo\r\n"),
        ReplyKind::Header,
    )?;
    let shared: Arc<[u8]> = Arc::from(b"Contact: <sip:10.0.0.1:5060>\r\n".as_ref());
    reply.add_shared(shared, ReplyKind::Header)?;
    reply.add(ReplyText::copied(b"reply body"), ReplyKind::Body)?;

    println!("=== Reply header block ===");
    println!("{}", String::from_utf8_lossy(&reply.render_headers()));

    let released = reply.filter_retain_shared();
    println!(
        "After promotion: {} fragment(s) survive, {} released",
        reply.len(),
        released
    );

    Ok(())
}
