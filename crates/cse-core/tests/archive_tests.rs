mod common;

use std::io::{Cursor, Read};

use common::{GAMESTATE, build_zip, save_zip, set_entry_claimed_size, set_entry_method};
use cse_core::archive::is_gamestate_name;
use cse_core::{EditError, SaveArchive, edited_file_name};
use zip::{CompressionMethod, ZipArchive};

fn raw_entries(bytes: &[u8]) -> Vec<(String, CompressionMethod, Vec<u8>)> {
    let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..zip.len())
        .map(|i| {
            let mut f = zip.by_index_raw(i).unwrap();
            let mut data = Vec::new();
            f.read_to_end(&mut data).unwrap();
            (f.name().to_string(), f.compression(), data)
        })
        .collect()
}

#[test]
fn loads_entries_and_extracts_gamestate() {
    let archive = SaveArchive::load(save_zip(GAMESTATE), "une.sav").unwrap();
    assert_eq!(archive.file_name(), "une.sav");
    let names: Vec<_> = archive.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["meta", "gamestate", "thumb.bin"]);
    assert_eq!(archive.entries()[0].compression, CompressionMethod::Stored);
    assert_eq!(archive.gamestate_entry().name, "gamestate");
    assert_eq!(archive.gamestate_entry().size, GAMESTATE.len() as u64);
    assert_eq!(archive.extract_text().unwrap(), GAMESTATE);
}

#[test]
fn rejects_non_zip_and_missing_gamestate() {
    let err = SaveArchive::load(b"definitely not a zip".to_vec(), "x.sav").unwrap_err();
    assert!(matches!(err, EditError::ArchiveFormat { .. }));

    let no_state = build_zip(&[("meta", b"a=1".as_slice(), CompressionMethod::Stored)]);
    let err = SaveArchive::load(no_state, "x.sav").unwrap_err();
    assert_eq!(
        err,
        EditError::EntryNotFound {
            entry: "gamestate".into()
        }
    );
}

#[test]
fn gamestate_may_sit_in_a_folder() {
    assert!(is_gamestate_name("gamestate"));
    assert!(is_gamestate_name("save/gamestate"));
    assert!(!is_gamestate_name("gamestate.bak"));
    assert!(!is_gamestate_name("old_gamestate"));
    let bytes = build_zip(&[("save/gamestate", b"a=1".as_slice(), CompressionMethod::Deflated)]);
    let archive = SaveArchive::load(bytes, "x.sav").unwrap();
    assert_eq!(archive.extract_text().unwrap(), "a=1");
}

#[test]
fn non_utf8_gamestate_is_a_format_error() {
    let bytes = build_zip(&[("gamestate", [b'a', b'=', 0xff, 0xfe].as_slice(), CompressionMethod::Stored)]);
    let archive = SaveArchive::load(bytes, "x.sav").unwrap();
    assert!(matches!(
        archive.extract_text(),
        Err(EditError::ArchiveFormat { .. })
    ));
}

#[test]
fn rebuild_copies_other_entries_raw() {
    let original = save_zip(GAMESTATE);
    let archive = SaveArchive::load(original.clone(), "une.sav").unwrap();
    let edited = GAMESTATE.replace("planet_size=30", "planet_size=25");
    let rebuilt = archive.rebuild("gamestate", edited.as_bytes()).unwrap();

    // source buffer untouched
    assert_eq!(archive.bytes(), original.as_slice());

    let before = raw_entries(&original);
    let after = raw_entries(&rebuilt);
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.0, a.0, "entry order");
        assert_eq!(b.1, a.1, "compression of {}", a.0);
        if a.0 != "gamestate" {
            assert_eq!(b.2, a.2, "raw bytes of {}", a.0);
        }
    }

    let reloaded = SaveArchive::load(rebuilt, "une.sav").unwrap();
    assert_eq!(reloaded.extract_text().unwrap(), edited);
}

#[test]
fn rebuild_keeps_stored_gamestate_stored() {
    let bytes = build_zip(&[
        ("gamestate", b"a=1".as_slice(), CompressionMethod::Stored),
        ("meta", b"b=2".as_slice(), CompressionMethod::Deflated),
    ]);
    let archive = SaveArchive::load(bytes, "x.sav").unwrap();
    let next = archive.with_gamestate("a=2").unwrap();
    assert_eq!(next.gamestate_entry().compression, CompressionMethod::Stored);
    assert_eq!(next.entries()[1].compression, CompressionMethod::Deflated);
    assert_eq!(next.extract_text().unwrap(), "a=2");
    assert_eq!(next.read_entry(1).unwrap(), b"b=2");
}

#[test]
fn rebuild_copies_undecodable_entries_unchanged() {
    let mut original = build_zip(&[
        ("meta", b"a=1".as_slice(), CompressionMethod::Stored),
        ("gamestate", GAMESTATE.as_bytes(), CompressionMethod::Deflated),
        ("thumb.bz2", b"BZh9 not really bzip2".as_slice(), CompressionMethod::Stored),
    ]);
    set_entry_method(&mut original, "thumb.bz2", 12);

    let archive = SaveArchive::load(original.clone(), "une.sav").unwrap();
    assert_eq!(archive.entries()[2].compression, CompressionMethod::BZIP2);
    assert_eq!(archive.extract_text().unwrap(), GAMESTATE);

    let next = archive.with_gamestate("a=2").unwrap();
    assert_eq!(next.entries()[2].compression, CompressionMethod::BZIP2);
    let (before, after) = (raw_entries(&original), raw_entries(next.bytes()));
    assert_eq!(before[2], after[2]);
    assert_eq!(after[2].2, b"BZh9 not really bzip2");
    assert_eq!(next.extract_text().unwrap(), "a=2");
}

#[test]
fn oversized_header_claim_does_not_drive_allocation() {
    let mut bytes = save_zip(GAMESTATE);
    set_entry_claimed_size(&mut bytes, "gamestate", 0xFFFF_FFF0);
    let archive = SaveArchive::load(bytes, "une.sav").unwrap();
    assert_eq!(archive.gamestate_entry().size, 0xFFFF_FFF0);
    assert_eq!(archive.extract_text().unwrap(), GAMESTATE);
}

#[test]
fn rebuild_of_unknown_entry_fails() {
    let archive = SaveArchive::load(save_zip("a=1"), "x.sav").unwrap();
    assert_eq!(
        archive.rebuild("nope", b"").unwrap_err(),
        EditError::EntryNotFound {
            entry: "nope".into()
        }
    );
}

#[test]
fn edited_names() {
    assert_eq!(edited_file_name("une.sav"), "une_edited.sav");
    assert_eq!(edited_file_name("autosave"), "autosave_edited");
}

#[test]
fn backup_copies_next_to_original() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("une.sav");
    std::fs::write(&p, save_zip("a=1")).unwrap();
    let b = cse_core::backup_file(&p).unwrap();
    assert!(b.exists());
    assert_eq!(b.parent(), p.parent());
    assert_eq!(std::fs::read(&b).unwrap(), std::fs::read(&p).unwrap());
    assert!(cse_core::backup_file(dir.path()).is_err());
}

#[test]
fn finds_saves_recursively() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("unitednationsofearth_1")).unwrap();
    std::fs::create_dir_all(dir.path().join("other")).unwrap();
    std::fs::write(dir.path().join("unitednationsofearth_1/2230.05.14.sav"), b"x").unwrap();
    std::fs::write(dir.path().join("unitednationsofearth_1/ironman.sav"), b"x").unwrap();
    std::fs::write(dir.path().join("other/notes.txt"), b"x").unwrap();
    let found = cse_core::saves::find_saves(dir.path());
    let names: Vec<_> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["2230.05.14.sav", "ironman.sav"]);
}
