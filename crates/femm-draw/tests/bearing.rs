use femm_draw::bearing::{build_bearing, BearingParams};
use femm_draw::geometry::Point;
use femm_draw::session::{Arg, Reply};
use femm_draw::{
    generate_pattern, translate, DrawCommand, Preprocessor, Problem, RemoteError, ScriptOptions,
    ScriptSession, Session,
};
use pretty_assertions::assert_eq;

/// Answers every query with a fixed value and rejects one command
struct Engine {
    sent: Vec<String>,
    reject: Option<&'static str>,
}

impl Session for Engine {
    fn call(&mut self, command: &str, args: &[Arg]) -> Result<Reply, RemoteError> {
        let line = femm_draw::session::format_call(command, args);
        if Some(command) == self.reject {
            return Err(RemoteError::new(line, "error: invalid geometry"));
        }
        self.sent.push(line.clone());
        let reply = if command == "mo_blockintegral" { "[-12.5]" } else { "" };
        Reply::parse(&line, reply)
    }
}

#[test]
fn bearing_reports_rotor_force() {
    let mut engine = Engine { sent: vec![], reject: None };
    let layout = build_bearing(&mut engine, &BearingParams::default()).unwrap();

    assert_eq!(layout.force_y.and_then(|r| r.scalar()), Some(-12.5));
    assert_eq!(layout.stator.len(), 3);
    for copies in layout.stator.iter() {
        assert_eq!(copies.len(), 4);
    }
    assert_eq!(engine.sent.first().map(String::as_str), Some("newdocument(0)"));
}

#[test]
fn bearing_stops_at_first_rejected_call() {
    let mut engine = Engine { sent: vec![], reject: Some("mi_addarc") };
    assert!(build_bearing(&mut engine, &BearingParams::default()).is_err());
    assert!(engine.sent.iter().all(|c| !c.starts_with("mi_addarc")));
    assert!(!engine.sent.iter().any(|c| c.starts_with("mi_createmesh")));
}

#[test]
fn offline_session_matches_live_calls() {
    let mut engine = Engine { sent: vec![], reject: None };
    build_bearing(&mut engine, &BearingParams::default()).unwrap();

    let mut script = ScriptSession::new();
    build_bearing(&mut script, &BearingParams::default()).unwrap();

    assert_eq!(script.lines().collect::<Vec<_>>(), engine.sent);
    assert_eq!(script.probe_names(), vec!["result_1"]);
}

#[test]
fn pattern_anchors_follow_up_geometry() {
    let mut script = ScriptSession::new();
    let mut pre = Preprocessor::new(&mut script, Problem::Magnetics);
    let pivot = Point::new(0.0, 0.0);
    let spoke = DrawCommand::line(Point::new(0.0, 10.0), Point::new(0.0, 20.0));

    let spokes = generate_pattern(&mut pre, &[spoke], pivot, 3).unwrap();
    let rim_start = spokes.point(0, 0, 1).unwrap();
    let rim_end = spokes.point(0, 1, 1).unwrap();
    generate_pattern(&mut pre, &[DrawCommand::arc(rim_start, rim_end, 120.0)], pivot, 3).unwrap();

    let lines: Vec<&str> = script.lines().collect();
    assert_eq!(lines.iter().filter(|l| l.starts_with("mi_addsegment")).count(), 3);
    assert!(lines.contains(&"mi_addarc(0, 20, -17.32051, -10, 120, 1)"));
}

#[test]
fn translate_model_file() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("ring.json");
    std::fs::write(
        &model,
        r#"{
            "definition": {"units": "meter", "kind": "axisymmetric"},
            "materials": [{"source": "library", "name": "Air"}],
            "steps": [
                {"step": "pattern", "pivot": [0, 0], "repeat": 6, "commands": [
                    {"op": "circle", "points": [[0, 5]], "radius": 1, "group": 3}
                ]}
            ],
            "analysis": {"solve": true, "probes": [{"group": 3, "integral": "area"}]}
        }"#,
    )
    .unwrap();

    let json = std::fs::read_to_string(&model).unwrap();
    let options = ScriptOptions {
        results_file: Some("area.txt".to_string()),
        quit: false,
        ..ScriptOptions::default()
    };
    let script = translate(&json, &options).unwrap();

    assert!(script.contains("mi_probdef(0, \"meters\", \"axi\", 0.00000001, 1, 30)\n"));
    assert_eq!(script.matches("mi_addarc(").count(), 12);
    assert!(script.contains("result_1 = mo_blockintegral(5)\n"));
    assert!(script.contains("write(results_handle, \"result_1\", \"\\t\", result_1, \"\\n\")"));
    assert!(!script.contains("quit()"));
}
