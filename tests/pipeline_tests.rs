//! Batch pipeline integration tests.
//!
//! Exercises the full pipeline against stub encoder and packer executables:
//! change-cache idempotence, per-file change detection, failure isolation,
//! dispatch by extension, and end-to-end normalization and compression.
//!
//! The stubs are small shell scripts, so this suite is Unix-only.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use lz4_flex::decompress_size_prepended;
use tempfile::TempDir;

use texbake::config::{PixelFormat, Quality};
use texbake::pipeline::{BatchOptions, BatchPipeline, ChangeCache, EncodeSettings};

// ============================================================================
// Test Utilities
// ============================================================================

/// Write an executable shell script stub.
fn write_stub(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Encoder stub that copies its input to the `-output` argument.
fn copy_encoder(dir: &Path) -> PathBuf {
    write_stub(
        dir,
        "etctool-copy",
        concat!(
            "#!/bin/sh\n",
            "in=\"$1\"\n",
            "shift\n",
            "out=\"\"\n",
            "while [ \"$#\" -gt 0 ]; do\n",
            "  if [ \"$1\" = \"-output\" ]; then out=\"$2\"; shift; fi\n",
            "  shift\n",
            "done\n",
            "cp \"$in\" \"$out\"\n",
        ),
    )
}

/// Encoder stub that always fails.
fn failing_encoder(dir: &Path) -> PathBuf {
    write_stub(dir, "etctool-fail", "#!/bin/sh\nexit 3\n")
}

/// Tool stub that records being spawned, for never-invoked assertions.
fn poison_tool(dir: &Path, name: &str, marker: &Path) -> PathBuf {
    write_stub(
        dir,
        name,
        &format!("#!/bin/sh\ntouch \"{}\"\nexit 0\n", marker.display()),
    )
}

/// Packer stub that emits a data file plus a composite image copied from a
/// pre-made sheet.
fn stub_packer(dir: &Path, sheet_source: &Path) -> PathBuf {
    write_stub(
        dir,
        "packer-stub",
        &format!(
            concat!(
                "#!/bin/sh\n",
                "data=\"$2\"\n",
                "dir=$(dirname \"$data\")\n",
                "cp \"{}\" \"$dir/sheet.png\"\n",
                "printf '{{\"meta\":{{\"image\":\"sheet.png\"}}}}' > \"$data\"\n",
            ),
            sheet_source.display()
        ),
    )
}

fn write_png(path: &Path, width: u32, height: u32, seed: u8) {
    let mut img = RgbaImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        *px = Rgba([seed, (x % 256) as u8, (y % 256) as u8, 255]);
    }
    img.save(path).unwrap();
}

fn options(out_root: &Path, etc_tool: &Path, packer: &Path) -> BatchOptions {
    BatchOptions {
        out_root: out_root.to_path_buf(),
        encode: EncodeSettings {
            format: PixelFormat::Etc2Alpha,
            quality: Quality::Normal,
        },
        alignment: 0,
        etc_tool: etc_tool.to_path_buf(),
        packer: packer.to_path_buf(),
        jobs: 1,
        verbose: false,
    }
}

/// Write a manifest of absolute source paths and return its path.
fn write_manifest<P: AsRef<Path>>(dir: &Path, sources: &[P]) -> PathBuf {
    let manifest = dir.join("assets.txt");
    let content: String = sources
        .iter()
        .map(|p| format!("{}\n", p.as_ref().display()))
        .collect();
    fs::write(&manifest, content).unwrap();
    manifest
}

// ============================================================================
// Change Cache Behavior
// ============================================================================

#[test]
fn test_batch_idempotence() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let a = temp.path().join("a.png");
    let b = temp.path().join("b.png");
    fs::write(&a, b"first image bytes").unwrap();
    fs::write(&b, b"second image bytes").unwrap();
    let manifest = write_manifest(temp.path(), &[&a, &b]);

    let encoder = copy_encoder(temp.path());
    let pipeline = BatchPipeline::new(options(&out, &encoder, Path::new("/bin/false")));

    let first = pipeline.run_manifest(&manifest).unwrap();
    assert_eq!(first.encoded_count(), 2);
    assert_eq!(first.failed_count(), 0);
    assert!(out.join("a.ktx.lz4").exists());
    assert!(out.join("b.ktx.lz4").exists());

    let sidecar = ChangeCache::sidecar_path(&manifest);
    let cache_after_first = fs::read(&sidecar).unwrap();

    // Second run over unchanged inputs: everything skips, cache unchanged
    let second = pipeline.run_manifest(&manifest).unwrap();
    assert_eq!(second.encoded_count(), 0);
    assert_eq!(second.skipped_count(), 2);
    assert_eq!(fs::read(&sidecar).unwrap(), cache_after_first);
}

#[test]
fn test_change_detection_reprocesses_only_modified_file() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let a = temp.path().join("a.png");
    let b = temp.path().join("b.png");
    let c = temp.path().join("c.png");
    fs::write(&a, b"alpha").unwrap();
    fs::write(&b, b"beta").unwrap();
    fs::write(&c, b"gamma").unwrap();
    let manifest = write_manifest(temp.path(), &[&a, &b, &c]);

    let encoder = copy_encoder(temp.path());
    let pipeline = BatchPipeline::new(options(&out, &encoder, Path::new("/bin/false")));

    pipeline.run_manifest(&manifest).unwrap();

    fs::write(&b, b"beta, but different now").unwrap();

    let report = pipeline.run_manifest(&manifest).unwrap();
    assert_eq!(report.encoded_count(), 1);
    assert_eq!(report.skipped_count(), 2);

    // Exactly the modified file was the one re-encoded
    let reencoded: Vec<_> = report
        .jobs
        .iter()
        .filter(|j| j.status == texbake::pipeline::JobStatus::Encoded)
        .map(|j| j.source.clone())
        .collect();
    assert_eq!(reencoded, vec![b.clone()]);
}

#[test]
fn test_failed_encode_retries_on_next_run() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let a = temp.path().join("a.png");
    fs::write(&a, b"image bytes").unwrap();
    let manifest = write_manifest(temp.path(), &[&a]);

    let bad = failing_encoder(temp.path());
    let failing = BatchPipeline::new(options(&out, &bad, Path::new("/bin/false")));
    let report = failing.run_manifest(&manifest).unwrap();
    assert_eq!(report.failed_count(), 1);

    // The failure left no cache entry, so a working run re-dispatches
    let good = copy_encoder(temp.path());
    let working = BatchPipeline::new(options(&out, &good, Path::new("/bin/false")));
    let report = working.run_manifest(&manifest).unwrap();
    assert_eq!(report.encoded_count(), 1);
    assert_eq!(report.skipped_count(), 0);
}

// ============================================================================
// Failure Isolation
// ============================================================================

#[test]
fn test_failure_isolation_batch_completes() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let a = temp.path().join("a.png");
    let b = temp.path().join("b.png");
    fs::write(&a, b"alpha").unwrap();
    fs::write(&b, b"beta").unwrap();
    let missing1 = temp.path().join("gone1.png");
    let missing2 = temp.path().join("gone2.png");
    let manifest = write_manifest(temp.path(), &[&a, &missing1, &b, &missing2]);

    let encoder = copy_encoder(temp.path());
    let pipeline = BatchPipeline::new(options(&out, &encoder, Path::new("/bin/false")));

    let report = pipeline.run_manifest(&manifest).unwrap();
    assert_eq!(report.jobs.len(), 4);
    assert_eq!(report.encoded_count(), 2);
    assert_eq!(report.failed_count(), 2);
    assert!(!report.is_success());

    // The failures did not disturb the successful entries' cache records
    let report = pipeline.run_manifest(&manifest).unwrap();
    assert_eq!(report.skipped_count(), 2);
    assert_eq!(report.failed_count(), 2);
}

// ============================================================================
// Dispatch by Extension
// ============================================================================

#[test]
fn test_atlas_routed_through_packer() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let sheet_src = temp.path().join("premade-sheet.png");
    write_png(&sheet_src, 8, 8, 42);

    let descriptor = temp.path().join("hud.tps");
    fs::write(&descriptor, b"<descriptor content>").unwrap();

    let encoder = copy_encoder(temp.path());
    let packer = stub_packer(temp.path(), &sheet_src);
    let pipeline = BatchPipeline::new(options(&out, &encoder, &packer));

    let report = pipeline.run_single(&descriptor);
    assert_eq!(report.encoded_count(), 1);

    // Data file retained, composite encoded+compressed then deleted
    assert!(out.join("hud.json").exists());
    assert!(out.join("sheet.ktx.lz4").exists());
    assert!(!out.join("sheet.png").exists());
}

#[test]
fn test_atlas_composite_deleted_even_when_encode_fails() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let sheet_src = temp.path().join("premade-sheet.png");
    write_png(&sheet_src, 8, 8, 7);

    let descriptor = temp.path().join("hud.tps");
    fs::write(&descriptor, b"<descriptor content>").unwrap();

    let encoder = failing_encoder(temp.path());
    let packer = stub_packer(temp.path(), &sheet_src);
    let pipeline = BatchPipeline::new(options(&out, &encoder, &packer));

    let report = pipeline.run_single(&descriptor);
    assert_eq!(report.failed_count(), 1);
    assert!(!out.join("sheet.png").exists());
}

#[test]
fn test_raster_never_routed_through_packer() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let a = temp.path().join("a.png");
    fs::write(&a, b"image bytes").unwrap();

    let marker = temp.path().join("packer-was-spawned");
    let encoder = copy_encoder(temp.path());
    let packer = poison_tool(temp.path(), "packer-poison", &marker);
    let pipeline = BatchPipeline::new(options(&out, &encoder, &packer));

    let report = pipeline.run_single(&a);
    assert_eq!(report.encoded_count(), 1);
    assert!(!marker.exists());
}

#[test]
fn test_unsupported_kind_spawns_nothing() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let source = temp.path().join("model.fbx");
    fs::write(&source, b"binary model data").unwrap();

    let enc_marker = temp.path().join("encoder-was-spawned");
    let pack_marker = temp.path().join("packer-was-spawned");
    let encoder = poison_tool(temp.path(), "encoder-poison", &enc_marker);
    let packer = poison_tool(temp.path(), "packer-poison", &pack_marker);
    let pipeline = BatchPipeline::new(options(&out, &encoder, &packer));

    let report = pipeline.run_single(&source);
    assert_eq!(report.failed_count(), 1);
    assert!(!enc_marker.exists());
    assert!(!pack_marker.exists());
}

// ============================================================================
// Normalization and Compression End-to-End
// ============================================================================

#[test]
fn test_normalized_image_flows_through_encode_and_compress() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let src = temp.path().join("sprite.png");
    write_png(&src, 5, 3, 9);

    let encoder = copy_encoder(temp.path());
    let mut opts = options(&out, &encoder, Path::new("/bin/false"));
    opts.alignment = 4;
    let pipeline = BatchPipeline::new(opts);

    let report = pipeline.run_single(&src);
    assert_eq!(report.encoded_count(), 1);

    // The copy-encoder passed the padded temp through, so decompressing the
    // artifact yields a decodable image at the aligned size
    let compressed = fs::read(out.join("sprite.ktx.lz4")).unwrap();
    let raw = decompress_size_prepended(&compressed).unwrap();
    let img = image::load_from_memory(&raw).unwrap();
    assert_eq!(img.width(), 8);
    assert_eq!(img.height(), 4);

    // The padded temp copy was cleaned up from the source directory
    let stragglers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.contains("pad"))
        .collect();
    assert!(stragglers.is_empty(), "leftover temp files: {:?}", stragglers);
}

#[test]
fn test_aligned_image_passes_through_unpadded() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let src = temp.path().join("sprite.png");
    write_png(&src, 8, 4, 3);
    let original = fs::read(&src).unwrap();

    let encoder = copy_encoder(temp.path());
    let mut opts = options(&out, &encoder, Path::new("/bin/false"));
    opts.alignment = 4;
    let pipeline = BatchPipeline::new(opts);

    let report = pipeline.run_single(&src);
    assert_eq!(report.encoded_count(), 1);

    let compressed = fs::read(out.join("sprite.ktx.lz4")).unwrap();
    let raw = decompress_size_prepended(&compressed).unwrap();
    assert_eq!(raw, original);
}

// ============================================================================
// Parallel Batches
// ============================================================================

#[test]
fn test_parallel_batch_matches_sequential_semantics() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let sources: Vec<PathBuf> = (0..6)
        .map(|i| {
            let path = temp.path().join(format!("tex{}.png", i));
            fs::write(&path, format!("image payload {}", i)).unwrap();
            path
        })
        .collect();
    let manifest = write_manifest(temp.path(), &sources);

    let encoder = copy_encoder(temp.path());
    let mut opts = options(&out, &encoder, Path::new("/bin/false"));
    opts.jobs = 4;
    let pipeline = BatchPipeline::new(opts);

    let first = pipeline.run_manifest(&manifest).unwrap();
    assert_eq!(first.encoded_count(), 6);
    assert_eq!(first.failed_count(), 0);
    for i in 0..6 {
        assert!(out.join(format!("tex{}.ktx.lz4", i)).exists());
    }

    // The cache persisted after the pool joined covers every job
    let second = pipeline.run_manifest(&manifest).unwrap();
    assert_eq!(second.skipped_count(), 6);
}

// ============================================================================
// Output Layout
// ============================================================================

#[test]
fn test_absolute_entries_land_flat_in_output_root() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let nested = temp.path().join("sprites/hero");
    fs::create_dir_all(&nested).unwrap();
    let src = nested.join("idle.png");
    fs::write(&src, b"idle frame").unwrap();

    let encoder = copy_encoder(temp.path());
    let pipeline = BatchPipeline::new(options(&out, &encoder, Path::new("/bin/false")));

    let report = pipeline.run_single(&src);
    assert_eq!(report.encoded_count(), 1);
    // Absolute entries mirror only the file name
    assert!(out.join("idle.ktx.lz4").exists());
}
