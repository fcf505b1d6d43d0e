use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn camera_tool(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_change_camera_framecount"))
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .unwrap()
}

fn write_track(path: &Path, n: usize) {
    let poses: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "transform_matrix": [
                    [1.0, 0.0, 0.0, i as f64],
                    [0.0, 1.0, 0.0, 0.0],
                    [0.0, 0.0, 1.0, 0.0],
                    [0.0, 0.0, 0.0, 1.0]
                ],
                "fx": 500.0
            })
        })
        .collect();
    fs::write(path, serde_json::to_vec_pretty(&json!({ "frames": poses })).unwrap()).unwrap();
}

#[test]
fn camera_tool_writes_target_count() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.json");
    let output = dir.path().join("out.json");
    write_track(&input, 40);

    let out = camera_tool(&[
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-m",
        "81",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let doc: Value = serde_json::from_slice(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(doc["frames"].as_array().unwrap().len(), 81);
    assert_eq!(doc["target_num_poses"], 81);
}

#[test]
fn camera_tool_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.json");
    let empty = dir.path().join("empty.json");
    let output = dir.path().join("out.json");
    write_track(&input, 10);
    fs::write(&empty, b"[]").unwrap();

    let run = |input: &Path, frames: &str| {
        camera_tool(&[
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "-m",
            frames,
        ])
        .status
        .code()
    };

    assert_eq!(run(&input, "0"), Some(4));
    assert_eq!(run(&input, "-5"), Some(4));
    assert_eq!(run(&empty, "81"), Some(3));
    assert_eq!(run(&dir.path().join("missing.json"), "81"), Some(6));
    assert_eq!(run(&input, "abc"), Some(2));
    assert!(!output.exists());
}

#[test]
fn video_tool_rejects_zero_target_before_reading() {
    let out = Command::new(env!("CARGO_BIN_EXE_change_video_framecount"))
        .args(["-i", "/no/such/in.mp4", "-o", "/no/such/out.mp4", "-m", "0"])
        .env("RUST_LOG", "error")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));
}

#[test]
fn pair_tool_reports_missing_video() {
    let dir = tempfile::tempdir().unwrap();
    let camera_in = dir.path().join("cameras.json");
    let camera_out = dir.path().join("cameras_81.json");
    write_track(&camera_in, 40);

    let out = Command::new(env!("CARGO_BIN_EXE_prepare_pair"))
        .arg("--camera-in")
        .arg(&camera_in)
        .arg("--camera-out")
        .arg(&camera_out)
        .arg("--video-in")
        .arg(dir.path().join("missing.mp4"))
        .arg("--video-out")
        .arg(dir.path().join("video_81.mp4"))
        .env("RUST_LOG", "error")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(6));
    assert!(!camera_out.exists());
}
