use std::{fs, process::Command};

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::NamedTempFile;

const IMAGE_LEN: usize = 0x100;

const LOCK_OFFSET: usize = 0x00;
const SRK_OFFSET: usize = 0x60;

/// Builds a scratch nvmem image with the given words programmed.
fn image_with(words: &[(usize, u32)]) -> NamedTempFile {
    let mut contents = vec![0u8; IMAGE_LEN];
    for &(offset, value) in words {
        contents[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
    }
    let image = NamedTempFile::new().unwrap();
    fs::write(image.path(), contents).unwrap();
    image
}

/// Builds a 32-byte SRK fuse file holding the given hash words.
fn fuse_file_with(words: [u32; 8]) -> NamedTempFile {
    let mut contents = Vec::with_capacity(32);
    for word in words {
        contents.extend_from_slice(&word.to_ne_bytes());
    }
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), contents).unwrap();
    file
}

fn imxfuse() -> Command {
    let mut cmd = Command::cargo_bin("imxfuse").unwrap();
    cmd.env_remove("IMXFUSE_DEVICE");
    cmd.env_remove("IMXFUSE_LOG");
    cmd
}

#[test]
fn hardware_access_requires_supported_soc() {
    // The build host is not an i.MX8M Mini, so the SoC probe must refuse
    // before the fuse device is ever opened.
    imxfuse()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported SoC"));
}

#[test]
fn dump_lists_every_word() {
    let image = image_with(&[]);

    imxfuse()
        .arg("dump")
        .arg("--image")
        .arg(image.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("LOCK"))
        .stdout(predicate::str::contains("BOOT_CFG4"))
        .stdout(predicate::str::contains("SRK_REVOKE"))
        .stdout(predicate::str::contains("GP21"));
}

#[test]
fn show_reports_unprogrammed_fuses() {
    let image = image_with(&[]);

    imxfuse()
        .arg("show")
        .arg("--image")
        .arg(image.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No SRK hashes programmed."))
        .stdout(predicate::str::contains("JTAG disabled:"))
        .stdout(predicate::str::contains("00:00:00:00:00:00"))
        .stdout(predicate::str::contains("unlocked"));
}

#[test]
fn program_then_show_matches() {
    let image = image_with(&[]);
    let fuse_file = fuse_file_with([1, 2, 3, 4, 5, 6, 7, 8]);

    imxfuse()
        .arg("program")
        .arg("--image")
        .arg(image.path())
        .arg("--fuse-file")
        .arg(fuse_file.path())
        .arg("--no-confirm")
        .assert()
        .success();

    imxfuse()
        .arg("show")
        .arg("--image")
        .arg(image.path())
        .arg("--fuse-file")
        .arg(fuse_file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("SRK fuses match desired programming."));
}

#[test]
fn program_conflict_leaves_image_untouched() {
    let image = image_with(&[(SRK_OFFSET + 3 * 4, 0xdead_beef)]);
    let fuse_file = fuse_file_with([1, 2, 3, 4, 5, 6, 7, 8]);

    imxfuse()
        .arg("program")
        .arg("--image")
        .arg(image.path())
        .arg("--fuse-file")
        .arg(fuse_file.path())
        .arg("--no-confirm")
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to change"));

    // No SRK word was written, not even the ones that were still zero.
    let contents = fs::read(image.path()).unwrap();
    for index in 0..8 {
        let offset = SRK_OFFSET + index * 4;
        let word = u32::from_ne_bytes(contents[offset..offset + 4].try_into().unwrap());
        let expected = if index == 3 { 0xdead_beef } else { 0 };
        assert_eq!(word, expected, "SRK word {index} changed");
    }
}

#[test]
fn program_rejects_short_fuse_file() {
    let image = image_with(&[]);
    let short_file = NamedTempFile::new().unwrap();
    fs::write(short_file.path(), [0u8; 16]).unwrap();

    imxfuse()
        .arg("program")
        .arg("--image")
        .arg(image.path())
        .arg("--fuse-file")
        .arg(short_file.path())
        .arg("--no-confirm")
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected exactly 32"));
}

#[test]
fn write_mac_is_write_once() {
    let image = image_with(&[]);

    imxfuse()
        .arg("write-mac")
        .arg("00:11:22:33:44:55")
        .arg("--image")
        .arg(image.path())
        .arg("--no-confirm")
        .assert()
        .success();

    imxfuse()
        .arg("show")
        .arg("--image")
        .arg(image.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("00:11:22:33:44:55"));

    imxfuse()
        .arg("write-mac")
        .arg("66:77:88:99:aa:bb")
        .arg("--image")
        .arg(image.path())
        .arg("--no-confirm")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already hold"));

    imxfuse()
        .arg("show")
        .arg("--image")
        .arg(image.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("00:11:22:33:44:55"));
}

#[test]
fn write_mac_rejects_malformed_address() {
    let image = image_with(&[]);

    imxfuse()
        .arg("write-mac")
        .arg("00:11:22:33:44")
        .arg("--image")
        .arg(image.path())
        .arg("--no-confirm")
        .assert()
        .failure();
}

#[test]
fn lock_refuses_relaxing_transition() {
    // SRK lock bit already blown.
    let image = image_with(&[(LOCK_OFFSET, 1 << 9)]);

    imxfuse()
        .arg("lock")
        .arg("srk")
        .arg("unlocked")
        .arg("--image")
        .arg(image.path())
        .arg("--no-confirm")
        .assert()
        .failure()
        .stderr(predicate::str::contains("relax"));
}

#[test]
fn lock_applies_forward_transition() {
    let image = image_with(&[(LOCK_OFFSET, 1 << 9)]);

    imxfuse()
        .arg("lock")
        .arg("gp1")
        .arg("write-protect")
        .arg("--image")
        .arg(image.path())
        .arg("--no-confirm")
        .assert()
        .success();

    let contents = fs::read(image.path()).unwrap();
    let lock_word = u32::from_ne_bytes(contents[0..4].try_into().unwrap());
    assert_eq!(lock_word, (1 << 9) | (0b01 << 20));

    imxfuse()
        .arg("show")
        .arg("--image")
        .arg(image.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("write-protect"));
}
