use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

// Enough of an assembler to produce the greeting firmware, plus an ELF32
// wrapper for it. Keeps the tests self-contained instead of shipping opaque
// binary fixtures.

fn lui(rd: u8, imm20: u32) -> u32 {
    (imm20 << 12) | ((rd as u32) << 7) | 0x37
}

fn addi(rd: u8, rs1: u8, imm: i32) -> u32 {
    ((imm as u32 & 0xFFF) << 20) | ((rs1 as u32) << 15) | ((rd as u32) << 7) | 0x13
}

fn sb(rs2: u8, offset: i32, rs1: u8) -> u32 {
    let imm = offset as u32 & 0xFFF;
    ((imm >> 5) << 25) | ((rs2 as u32) << 20) | ((rs1 as u32) << 15) | ((imm & 0x1F) << 7) | 0x23
}

fn greeting_program(message: &[u8], report_success: bool) -> Vec<u32> {
    let mut program = vec![
        lui(5, 0x20000),  // t0 = UART base
        addi(6, 0, 1),    // t1 = 1
        sb(6, 0x8, 5),    // txctrl = 1
    ];
    for &byte in message {
        program.push(addi(7, 0, byte as i32));
        program.push(sb(7, 0x0, 5));
    }
    if report_success {
        program.push(addi(3, 0, 1)); // gp = 1
    }
    program.push(0x0000_006F); // jal x0, 0
    program
}

fn elf32(entry: u32, load_addr: u32, words: &[u32]) -> Vec<u8> {
    let code: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    let mut out = Vec::new();
    out.extend_from_slice(&[0x7F, b'E', b'L', b'F', 1, 1, 1, 0]);
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&2u16.to_le_bytes()); // e_type = EXEC
    out.extend_from_slice(&243u16.to_le_bytes()); // e_machine = EM_RISCV
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&entry.to_le_bytes());
    out.extend_from_slice(&52u32.to_le_bytes()); // e_phoff
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&52u16.to_le_bytes()); // e_ehsize
    out.extend_from_slice(&32u16.to_le_bytes()); // e_phentsize
    out.extend_from_slice(&1u16.to_le_bytes()); // e_phnum
    out.extend_from_slice(&40u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    out.extend_from_slice(&1u32.to_le_bytes()); // p_type = PT_LOAD
    out.extend_from_slice(&84u32.to_le_bytes()); // p_offset
    out.extend_from_slice(&load_addr.to_le_bytes());
    out.extend_from_slice(&load_addr.to_le_bytes());
    out.extend_from_slice(&(code.len() as u32).to_le_bytes());
    out.extend_from_slice(&(code.len() as u32).to_le_bytes());
    out.extend_from_slice(&5u32.to_le_bytes()); // p_flags = R+X
    out.extend_from_slice(&4u32.to_le_bytes());

    out.extend_from_slice(&code);
    out
}

fn temp_path(prefix: &str, ext: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push("hartsim-tests");
    let _ = std::fs::create_dir_all(&dir);
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    dir.join(format!("{}-{}.{}", prefix, nonce, ext))
}

fn write_greeting_elf(prefix: &str, message: &[u8], report_success: bool) -> PathBuf {
    let path = temp_path(prefix, "elf");
    let elf = elf32(
        0x8000_0000,
        0x8000_0000,
        &greeting_program(message, report_success),
    );
    std::fs::write(&path, elf).expect("Failed to write firmware fixture");
    path
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_hartsim"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("HartSim"));
}

#[test]
fn test_cli_load_missing_file() {
    let output = Command::new(env!("CARGO_BIN_EXE_hartsim"))
        .arg("no_such_firmware.elf")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_cli_runs_greeting_firmware() {
    let firmware = write_greeting_elf("greeting", b"hello riscv!\n", true);

    let output = Command::new(env!("CARGO_BIN_EXE_hartsim"))
        .arg(&firmware)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("hello riscv!\n"));

    let _ = std::fs::remove_file(&firmware);
}

#[test]
fn test_cli_exit_status_reflects_gp() {
    // Same program, but the firmware never reports success through gp.
    let firmware = write_greeting_elf("no-verdict", b"hello riscv!\n", false);

    let output = Command::new(env!("CARGO_BIN_EXE_hartsim"))
        .args([firmware.to_str().unwrap(), "--max-steps", "100"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());

    let _ = std::fs::remove_file(&firmware);
}

#[test]
fn test_cli_no_uart_stdout_suppresses_echo() {
    let firmware = write_greeting_elf("quiet", b"hello riscv!\n", true);

    let output = Command::new(env!("CARGO_BIN_EXE_hartsim"))
        .args([firmware.to_str().unwrap(), "--no-uart-stdout"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("hello riscv!"));

    let _ = std::fs::remove_file(&firmware);
}

#[test]
fn test_cli_writes_snapshot() {
    let firmware = write_greeting_elf("snapshot", b"ok\n", true);
    let snapshot_path = temp_path("snapshot", "json");

    let output = Command::new(env!("CARGO_BIN_EXE_hartsim"))
        .args([
            firmware.to_str().unwrap(),
            "--snapshot",
            snapshot_path.to_str().unwrap(),
            "--no-uart-stdout",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let snapshot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&snapshot_path).unwrap()).unwrap();
    assert_eq!(snapshot["cpu"]["x"].as_array().unwrap().len(), 32);
    assert_eq!(snapshot["cpu"]["x"][3], 1); // gp

    let _ = std::fs::remove_file(&firmware);
    let _ = std::fs::remove_file(&snapshot_path);
}

#[test]
fn test_cli_trace_prints_listing() {
    let firmware = write_greeting_elf("trace", b"x", true);

    let output = Command::new(env!("CARGO_BIN_EXE_hartsim"))
        .args([firmware.to_str().unwrap(), "--trace", "--no-uart-stdout"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    // First instruction of the greeting firmware.
    assert!(stdout.contains("lui\tt0,0x20000"));

    let _ = std::fs::remove_file(&firmware);
}

#[test]
fn test_cli_board_file() {
    let firmware = write_greeting_elf("board", b"hello riscv!\n", true);
    let board_path = temp_path("board", "yaml");
    std::fs::write(
        &board_path,
        r#"
name: "test-board"
arch: "rv32i"
ram:
  base: 0x80000000
  size: "1 MiB"
peripherals:
  - id: "uart0"
    type: "uart"
    base_address: 0x20000000
    size: "4 KiB"
"#,
    )
    .expect("Failed to write board file");

    let output = Command::new(env!("CARGO_BIN_EXE_hartsim"))
        .args([
            firmware.to_str().unwrap(),
            "--board",
            board_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("hello riscv!\n"));

    let _ = std::fs::remove_file(&firmware);
    let _ = std::fs::remove_file(&board_path);
}

#[test]
fn test_cli_rejects_unsupported_board_arch() {
    let firmware = write_greeting_elf("badboard", b"x", true);
    let board_path = temp_path("badboard", "yaml");
    std::fs::write(
        &board_path,
        r#"
name: "wrong"
arch: "armv7m"
ram:
  base: 0x20000000
  size: "64 KiB"
"#,
    )
    .expect("Failed to write board file");

    let output = Command::new(env!("CARGO_BIN_EXE_hartsim"))
        .args([
            firmware.to_str().unwrap(),
            "--board",
            board_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());

    let _ = std::fs::remove_file(&firmware);
    let _ = std::fs::remove_file(&board_path);
}
