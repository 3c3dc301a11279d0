use super::*;
use std::io;

/// Output sink the tests can read back.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock_or_recover(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&lock_or_recover(&self.0))
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn session() -> (UciSession, Captured) {
    let captured = Captured::default();
    let out: Output = Arc::new(Mutex::new(Box::new(captured.clone())));
    let session = UciSession::new(PvsEngine::new(1), Duration::from_millis(10), out);
    (session, captured)
}

fn run(session: &mut UciSession, lines: &[&str]) {
    for line in lines {
        assert_eq!(session.handle_line(line), Flow::Continue, "{line}");
    }
    session.wait();
}

#[test]
fn test_handshake_lists_options() {
    let (mut session, out) = session();
    run(&mut session, &["uci", "isready"]);
    let lines = out.lines();
    assert!(lines[0].starts_with("id name "));
    assert!(lines.iter().any(|l| l.starts_with("option name Hash type spin")));
    assert!(lines.iter().any(|l| l == "option name Clear Hash type button"));
    assert!(lines.iter().any(|l| l.starts_with("option name MoveOverhead type spin")));
    assert_eq!(lines[lines.len() - 2], "uciok");
    assert_eq!(lines[lines.len() - 1], "readyok");
}

#[test]
fn test_go_depth_prints_info_then_bestmove() {
    let (mut session, out) = session();
    run(&mut session, &["position startpos moves e2e4", "go depth 3"]);
    let lines = out.lines();
    let infos: Vec<&String> = lines.iter().filter(|l| l.starts_with("info depth")).collect();
    assert_eq!(infos.len(), 3);
    assert!(infos[0].contains(" score cp 0 "));
    assert!(infos.iter().all(|l| l.contains(" pv ")));

    let best = lines.last().unwrap();
    assert!(best.starts_with("bestmove "));
    assert_ne!(best, "bestmove 0000");
}

#[test]
fn test_checkmated_position_reports_mate_and_null_move() {
    let (mut session, out) = session();
    run(
        &mut session,
        &[
            "position startpos moves f2f3 e7e5 g2g4 d8h4",
            "go depth 4",
        ],
    );
    let lines = out.lines();
    assert!(lines.iter().any(|l| l.contains("score mate 0")));
    assert_eq!(lines.last().map(String::as_str), Some("bestmove 0000"));
}

#[test]
fn test_perft_divide_sums_to_total() {
    let (mut session, out) = session();
    run(&mut session, &["position startpos", "go perft 2"]);
    let lines = out.lines();
    assert_eq!(lines.iter().filter(|l| l.ends_with(": 20")).count(), 20);
    assert_eq!(lines.last().map(String::as_str), Some("Nodes searched: 400"));
}

#[test]
fn test_malformed_position_keeps_previous_state() {
    let (mut session, out) = session();
    run(
        &mut session,
        &[
            "position startpos moves e2e4 e7e5",
            "position startpos moves e2e5",
            "position fen not/a/fen w - - 0 1",
            "position sideways",
            "position fen 4k3/4r3/8/8/8/8/8/4K3 b - - 0 1",
            "position fen 4k3/8/8/4P3/8/8/8/4K3 w - e6 0 1",
            "go perft 1",
        ],
    );
    assert_eq!(
        out.lines().last().map(String::as_str),
        Some("Nodes searched: 29")
    );
}

#[test]
fn test_options_are_applied() {
    let (mut session, _) = session();
    run(
        &mut session,
        &[
            "setoption name Hash value 8",
            "setoption name MoveOverhead value 250",
            "setoption name Clear Hash",
            "setoption name NoSuchOption value 3",
            "setoption garbage",
        ],
    );
    assert_eq!(lock_or_recover(&session.engine).hash_mb(), 8);
    assert_eq!(session.move_overhead, Duration::from_millis(250));

    run(&mut session, &["setoption name MoveOverhead value 999999"]);
    assert_eq!(session.move_overhead, Duration::from_millis(5000));
}

#[test]
fn test_stop_ends_an_infinite_search() {
    let (mut session, out) = session();
    assert_eq!(session.handle_line("position startpos"), Flow::Continue);
    assert_eq!(session.handle_line("go infinite"), Flow::Continue);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(session.handle_line("stop"), Flow::Continue);

    let lines = out.lines();
    let best = lines.last().unwrap();
    assert!(best.starts_with("bestmove "));
    assert_ne!(best, "bestmove 0000");
}

#[test]
fn test_quit_and_unknown_commands() {
    let (mut session, out) = session();
    assert_eq!(session.handle_line(""), Flow::Continue);
    assert_eq!(session.handle_line("xyzzy 1 2 3"), Flow::Continue);
    assert_eq!(session.handle_line("quit"), Flow::Quit);
    assert!(out.lines().is_empty());
}

#[test]
fn test_new_game_resets_the_position() {
    let (mut session, out) = session();
    run(
        &mut session,
        &["position startpos moves e2e4 e7e5", "ucinewgame", "go perft 1"],
    );
    assert_eq!(
        out.lines().last().map(String::as_str),
        Some("Nodes searched: 20")
    );
}
