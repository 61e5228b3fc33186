use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use weibo_blinko::config::{self, Config};
use weibo_blinko::model::{Backup, SortOrder};
use weibo_blinko::pipeline::{run, RunOptions};

const HEADER: &str = "id,正文,话题,@用户,位置,工具,点赞数,评论数,转发数,完整日期";

struct Fixture {
    dir: TempDir,
    cfg: Config,
}

impl Fixture {
    fn new(rows: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut csv = format!("\u{feff}{HEADER}\n");
        for row in rows {
            csv.push_str(row);
            csv.push('\n');
        }
        fs::write(dir.path().join("weibo.csv"), csv).unwrap();
        fs::create_dir_all(dir.path().join("media")).unwrap();
        Self {
            dir,
            cfg: config::load(None).unwrap(),
        }
    }

    fn add_media(&self, category: &str, name: &str, bytes: &[u8]) {
        let sub = match category {
            "img" => &self.cfg.media.images,
            "video" => &self.cfg.media.videos,
            _ => &self.cfg.media.live_photos,
        };
        let dir = self.dir.path().join("media").join(sub);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), bytes).unwrap();
    }

    fn opts(&self, order: SortOrder) -> RunOptions {
        RunOptions {
            csv: self.dir.path().join("weibo.csv"),
            media_root: self.dir.path().join("media"),
            output_dir: self.out(),
            export_template: None,
            seq_start: 1,
            seq_order: order,
            no_zip: true,
        }
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("blinko_bko")
    }

    fn backup(&self) -> Backup {
        let raw = fs::read_to_string(self.out().join("pgdump/bak.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn archives_in(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.ends_with(".bko"))
        .collect()
}

#[test]
fn two_posts_oldest_first() {
    let fx = Fixture::new(&[
        "222,world,,,,,,,,2023-01-02 10:00:00",
        "111,hello,,,,,,,,2023-01-01 10:00:00",
    ]);
    fx.add_media("img", "20230101T_111_1.jpg", b"jpeg-bytes");

    let report = run(&fx.cfg, &fx.opts(SortOrder::Oldest), clock()).unwrap();
    assert_eq!(report.notes, 2);
    assert_eq!(report.attachments, 1);
    assert!(report.archive.is_none());

    let backup = fx.backup();
    assert_eq!(backup.notes.len(), 2);
    let (n1, n2) = (&backup.notes[0], &backup.notes[1]);
    assert_eq!(n1.id, 1);
    assert_eq!(n2.id, 2);
    assert_eq!(n1.attachments.len(), 1);
    assert!(n2.attachments.is_empty());

    let att = &n1.attachments[0];
    assert_eq!(att.note_id, 1);
    assert_eq!(att.mime, "image/jpeg");
    assert_eq!(att.size, "10");
    assert!(fx.out().join("files").join(&att.name).is_file());
    assert!(n1.content.starts_with("# 2023-01-01 10:00:00\n"));
    assert!(n1.content.contains("hello"));
    assert!(n1.content.contains(&format!("![]({})", att.path)));
    assert!(n2.content.contains("world"));

    for sub in ["files", "pgdump", "plugins", "vector"] {
        assert!(fx.out().join(sub).is_dir(), "{sub} missing");
    }
    let staging = fx.out().join(format!("files/markdown_extract_{}", clock().timestamp_millis()));
    assert_eq!(fs::read_dir(staging).unwrap().count(), 2);
}

#[test]
fn bad_dates_are_dropped_and_ids_are_contiguous() {
    let fx = Fixture::new(&[
        "1,a,,,,,,,,2023-01-01 10:00:00",
        "2,b,,,,,,,,yesterday",
        "3,c,,,,,,,,2023-01-03T10:00:00",
        "4,d,,,,,,,,",
        "5,e,,,,,,,,2023-01-02 10:00:00",
    ]);
    let mut opts = fx.opts(SortOrder::Newest);
    opts.seq_start = 40;
    run(&fx.cfg, &opts, clock()).unwrap();

    let backup = fx.backup();
    let ids: Vec<i64> = backup.notes.iter().map(|n| n.id).collect();
    assert_eq!(ids, [40, 41, 42]);
    let bodies: Vec<bool> = ["c", "e", "a"]
        .iter()
        .zip(&backup.notes)
        .map(|(t, n)| n.content.contains(&format!("\n{t}\n")))
        .collect();
    assert_eq!(bodies, [true, true, true]);
    let stamps: Vec<&str> = backup.notes.iter().map(|n| n.created_at.as_str()).collect();
    let mut sorted = stamps.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(stamps, sorted);
}

#[test]
fn same_timestamp_posts_get_distinct_files() {
    let fx = Fixture::new(&[
        "111,x,,,,,,,,2023-01-01 10:00:00",
        "222,y,,,,,,,,2023-01-01 10:00:00",
    ]);
    fx.add_media("img", "20230101T_111_1.jpg", b"a");
    fx.add_media("video", "20230101T_111.mp4", b"bb");
    fx.add_media("img", "20230101T_222_1.jpg", b"ccc");

    run(&fx.cfg, &fx.opts(SortOrder::Oldest), clock()).unwrap();
    let backup = fx.backup();

    let atts: Vec<_> = backup.notes.iter().flat_map(|n| &n.attachments).collect();
    let ids: Vec<i64> = atts.iter().map(|a| a.id).collect();
    assert_eq!(ids, [1, 2, 3]);

    let mut names: Vec<&str> = atts.iter().map(|a| a.name.as_str()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 3);
    for att in &atts {
        let on_disk = fs::metadata(fx.out().join("files").join(&att.name)).unwrap();
        assert_eq!(att.size, on_disk.len().to_string());
    }
    assert_eq!(atts[2].size, "3");

    let video = &backup.notes[0].attachments[1];
    assert_eq!(video.mime, "video/mp4");
    assert!(backup.notes[0].content.contains(&format!("[视频]({})", video.path)));
}

#[test]
fn rerun_produces_identical_index() {
    let fx = Fixture::new(&[
        "111,hello,#t#,,,,1,2,3,2023-01-01 10:00:00",
        "222,world,,,,,,,,2023-01-02 10:00:00",
    ]);
    fx.add_media("img", "20230101T_111_1.jpg", b"jpeg");
    fx.add_media("live", "20230101T_111_1.mov", b"live");

    run(&fx.cfg, &fx.opts(SortOrder::Newest), clock()).unwrap();
    let first = fs::read_to_string(fx.out().join("pgdump/bak.json")).unwrap();
    fs::write(fx.out().join("files/leftover.txt"), "x").unwrap();

    run(&fx.cfg, &fx.opts(SortOrder::Newest), clock()).unwrap();
    let second = fs::read_to_string(fx.out().join("pgdump/bak.json")).unwrap();

    assert_eq!(first, second);
    assert!(!fx.out().join("files/leftover.txt").exists());
}

#[test]
fn defaults_without_template() {
    let fx = Fixture::new(&["1,a,,,,,,,,2023-01-01 10:00:00"]);
    run(&fx.cfg, &fx.opts(SortOrder::Newest), clock()).unwrap();

    let raw: Value =
        serde_json::from_str(&fs::read_to_string(fx.out().join("pgdump/bak.json")).unwrap())
            .unwrap();
    assert_eq!(raw["version"], "1.7.0");
    assert_eq!(raw["exportTime"], "2024-03-01T12:00:00Z");
    let account = &raw["notes"][0]["account"];
    assert_eq!(account["id"], 1);
    assert_eq!(account["password"], "");
    assert_eq!(account["apiToken"], "");
    assert!(account["linkAccountId"].is_null());
}

#[test]
fn template_supplies_account_and_version() {
    let fx = Fixture::new(&["1,a,,,,,,,,2023-01-01 10:00:00"]);
    fx.add_media("img", "20230101T_1_1.png", b"png");
    let tpl = fx.dir.path().join("old_export");
    fs::create_dir_all(tpl.join("pgdump")).unwrap();
    fs::write(
        tpl.join("pgdump/bak.json"),
        r#"{"version":"1.8.3","notes":[{"id":9,"account":{"id":4,"name":"博主","role":"superadmin"}}]}"#,
    )
    .unwrap();

    let mut opts = fx.opts(SortOrder::Newest);
    opts.export_template = Some(tpl);
    run(&fx.cfg, &opts, clock()).unwrap();

    let backup = fx.backup();
    assert_eq!(backup.version, "1.8.3");
    let note = &backup.notes[0];
    assert_eq!(note.account.id(), 4);
    assert_eq!(note.account.0["name"], "博主");
    assert_eq!(note.attachments[0].account_id, 4);

    // non-ASCII is written literally
    let raw = fs::read_to_string(fx.out().join("pgdump/bak.json")).unwrap();
    assert!(raw.contains("博主"));
}

#[test]
fn archive_is_written_unless_disabled() {
    let fx = Fixture::new(&["1,a,,,,,,,,2023-01-01 10:00:00"]);
    run(&fx.cfg, &fx.opts(SortOrder::Newest), clock()).unwrap();
    assert!(archives_in(fx.dir.path()).is_empty());

    let mut opts = fx.opts(SortOrder::Newest);
    opts.no_zip = false;
    let report = run(&fx.cfg, &opts, clock()).unwrap();
    assert_eq!(archives_in(fx.dir.path()), ["blinko_bko.bko"]);
    assert_eq!(report.archive, Some(fx.dir.path().join("blinko_bko.bko")));

    let archive = zip::ZipArchive::new(File::open(fx.dir.path().join("blinko_bko.bko")).unwrap())
        .unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"blinko_bko/pgdump/bak.json"));
    assert!(names.iter().all(|n| n.starts_with("blinko_bko/")));
}

#[test]
fn seq_start_overflow_is_an_error() {
    let fx = Fixture::new(&[
        "1,a,,,,,,,,2023-01-01 10:00:00",
        "2,b,,,,,,,,2023-01-02 10:00:00",
    ]);
    let mut opts = fx.opts(SortOrder::Oldest);
    opts.seq_start = i64::MAX;
    let err = run(&fx.cfg, &opts, clock()).unwrap_err();
    assert!(format!("{err:#}").contains("overflows"));
    assert!(!fx.out().join("pgdump/bak.json").exists());
}
