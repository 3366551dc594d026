//! End-to-end: mod directories on disk through parse, detect, resolve, commit
//! and detection again with the generated patch mod loaded.

use camino::{Utf8Path, Utf8PathBuf};
use pdx_conflict::{
    parse_mods, ConflictSession, FsModSource, IndexedDefinitions, ModOrder, ModSource,
    PatchStateMode, PatchWriter, PriorityType,
};
use pdx_script::{GameType, ParserRegistry, ValueType};
use std::fs;
use tempfile::{tempdir, TempDir};

fn write_mod(root: &Utf8Path, name: &str, files: &[(&str, &str)]) -> Utf8PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("descriptor.mod"), format!("name=\"{name}\"\n")).unwrap();
    for (path, text) in files {
        let path = dir.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
    dir
}

fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}

fn load(game: &GameType, dirs: &[Utf8PathBuf]) -> (ModOrder, IndexedDefinitions) {
    let registry = ParserRegistry::for_game(game);
    let sources: Vec<Box<dyn ModSource>> = dirs
        .iter()
        .map(|d| Box::new(FsModSource::new(d.clone())) as Box<dyn ModSource>)
        .collect();
    let (parsed, definitions) = parse_mods(sources, &registry).unwrap();
    let order = ModOrder::new(parsed.iter().map(|m| m.name.clone()));
    (order, definitions)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn open_session(root: &Utf8Path, dirs: &[Utf8PathBuf]) -> ConflictSession {
    open_session_in_mode(root, dirs, PatchStateMode::Default)
}

fn open_session_in_mode(
    root: &Utf8Path,
    dirs: &[Utf8PathBuf],
    mode: PatchStateMode,
) -> ConflictSession {
    init_tracing();
    let game = GameType::stellaris();
    let (order, definitions) = load(&game, dirs);
    let writer = PatchWriter::new(root.join("patches"), "test", &game);
    ConflictSession::detect(game, order, &definitions, mode, "", writer)
}

#[test]
fn test_lios_category_picks_last_mod() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    let a = write_mod(&root, "A", &[("events/a.txt", "x = {\n\tvalue = a\n}\n")]);
    let b = write_mod(&root, "B", &[("events/b.txt", "x = {\n\tvalue = b\n}\n")]);
    let session = open_session(&root, &[a, b]);

    let candidates = session.candidates("events-txt", "x").unwrap();
    assert_eq!(candidates.len(), 2);
    let result = session.eval_definition_priority(&candidates);
    assert_eq!(result.priority_type, PriorityType::Lios);
    assert_eq!(result.definition.unwrap().mod_name, "B");
}

#[test]
fn test_fios_category_picks_first_mod() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    let a = write_mod(&root, "A", &[("interface/a.gui", "x = {\n\tsize = 1\n}\n")]);
    let b = write_mod(&root, "B", &[("interface/b.gui", "x = {\n\tsize = 2\n}\n")]);
    let session = open_session(&root, &[a, b]);

    let candidates = session.candidates("interface-gui", "x").unwrap();
    let result = session.eval_definition_priority(&candidates);
    assert_eq!(result.priority_type, PriorityType::Fios);
    assert_eq!(result.definition.unwrap().mod_name, "A");
}

#[test]
fn test_defines_block_yields_one_variable_per_line() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    let a = write_mod(
        &root,
        "A",
        &[(
            "common/defines/00_defines.txt",
            "NGameplay = {\n\tFIRST = 1\n\tSECOND = 2\n\t# note\n\tTHIRD = 3\n}\n",
        )],
    );
    let (_, definitions) = load(&GameType::stellaris(), &[a]);
    let defines = definitions.get_by_type("common/defines/NGameplay-txt");
    assert_eq!(defines.len(), 3);
    assert!(defines.iter().all(|d| d.value_type == ValueType::Variable));
    let mut ids: Vec<&str> = defines.iter().map(|d| d.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["FIRST", "SECOND", "THIRD"]);
}

#[test]
fn test_single_mod_and_identical_code() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    let a = write_mod(
        &root,
        "A",
        &[("events/a.txt", "solo = { a }\nshared = {\n\tvalue = 1\n}\n")],
    );
    let b = write_mod(&root, "B", &[("events/b.txt", "shared = {\n    value  =  1\n}\n")]);
    let session = open_session(&root, &[a, b]);

    session
        .with_result(|result| {
            assert!(!result.all_conflicts.contains("events-txt", "solo"));
            assert!(!result.conflicts.contains("events-txt", "shared"));
            assert!(result.overwritten_conflicts.contains("events-txt", "shared"));
        })
        .unwrap();
}

#[test]
fn test_fingerprint_is_stable_across_formatting() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    let a = write_mod(&root, "A", &[("events/a.txt", "x = {\n\tvalue = 1\n}\n")]);
    let b = write_mod(&root, "B", &[("events/b.txt", "x={\n        value = 1 # same\n}\n")]);
    let (_, definitions) = load(&GameType::stellaris(), &[a, b]);
    let bucket = definitions.get_by_type_and_id("events-txt", "x");
    assert_eq!(bucket.len(), 2);
    assert_eq!(bucket[0].fingerprint, bucket[1].fingerprint);
}

#[test]
fn test_ignore_commits_first_candidate() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    let a = write_mod(&root, "A", &[("events/a.txt", "x = {\n\tvalue = a\n}\n")]);
    let b = write_mod(&root, "B", &[("events/b.txt", "x = {\n\tvalue = b\n}\n")]);
    let session = open_session(&root, &[a, b]);

    let candidates = session.candidates("events-txt", "x").unwrap();
    let first = candidates[0].clone();
    assert_eq!(first.mod_name, "A");
    assert!(session.ignore_mod_patch(&candidates[1]).unwrap());

    session
        .with_result(|result| {
            assert!(!result.conflicts.contains("events-txt", "x"));
            assert!(result.ignored_conflicts.contains("events-txt", "x"));
        })
        .unwrap();
    let text = fs::read_to_string(session.writer().patch_dir().join("events/zzz_a.txt")).unwrap();
    assert_eq!(text, format!("{}\n", first.code.trim_end()));
}

#[test]
fn test_applied_patch_settles_bucket_on_redetection() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    let a = write_mod(&root, "A", &[("events/a.txt", "x = {\n\tvalue = a\n}\n")]);
    let b = write_mod(&root, "B", &[("events/b.txt", "x = {\n\tvalue = b\n}\n")]);

    let patch_dir = {
        let session = open_session(&root, &[a.clone(), b.clone()]);
        let candidates = session.candidates("events-txt", "x").unwrap();
        let winner = session.eval_definition_priority(&candidates).definition.unwrap();
        assert!(session.apply_mod_patch(&winner).unwrap());
        session.writer().patch_dir()
    };

    let session = open_session(&root, &[a, b, patch_dir]);
    session
        .with_result(|result| {
            assert!(!result.conflicts.contains("events-txt", "x"));
            let resolved = result.resolved_conflicts.get_by_type_and_id("events-txt", "x");
            assert_eq!(resolved.len(), 1);
            assert_eq!(resolved[0].mod_name, "pdx_patch_test");
        })
        .unwrap();

    let candidates = session.candidates("events-txt", "x").unwrap();
    assert!(candidates.iter().all(|d| d.mod_name != "pdx_patch_test"));
}

#[test]
fn test_whole_text_files_differing_only_in_comments_conflict() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    let body = "on_game_start = {\n\tevents = { a.1 }\n}\n";
    let a = write_mod(&root, "A", &[("common/on_actions/00_on.txt", body)]);
    let b = write_mod(
        &root,
        "B",
        &[("common/on_actions/00_on.txt", &format!("# tweak\n{body}"))],
    );
    let session = open_session(&root, &[a, b]);

    let candidates = session.candidates("common/on_actions-txt", "00_on.txt").unwrap();
    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|d| d.value_type == ValueType::WholeTextFile));
    session
        .with_result(|result| {
            assert!(result.conflicts.contains("common/on_actions-txt", "00_on.txt"));
            assert!(result.overwritten_conflicts.is_empty());
        })
        .unwrap();
}

#[test]
fn test_binary_files_conflict_on_any_byte() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    let a = write_mod(&root, "A", &[("gfx/icons/icon.dds", "DDS\u{1}\u{2}")]);
    let b = write_mod(&root, "B", &[("gfx/icons/icon.dds", "DDS\u{1}\u{3}")]);
    let c = write_mod(&root, "C", &[("gfx/icons/other.dds", "DDS\u{1}\u{2}")]);
    let session = open_session(&root, &[a, b, c]);

    let candidates = session.candidates("gfx/icons/binary", "icon.dds").unwrap();
    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|d| d.value_type == ValueType::Binary));
    session
        .with_result(|result| {
            assert!(result.conflicts.contains("gfx/icons/binary", "icon.dds"));
            assert!(!result.all_conflicts.contains("gfx/icons/binary", "other.dds"));
        })
        .unwrap();
}

#[test]
fn test_localisation_skipped_without_localization_modes() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    let a = write_mod(
        &root,
        "A",
        &[
            ("localisation/english/a_l_english.yml", "l_english:\n greeting:0 \"Hello\"\n"),
            ("events/a.txt", "x = {\n\tvalue = a\n}\n"),
        ],
    );
    let b = write_mod(
        &root,
        "B",
        &[
            ("localisation/english/b_l_english.yml", "l_english:\n greeting:0 \"Hi\"\n"),
            ("events/b.txt", "x = {\n\tvalue = b\n}\n"),
        ],
    );
    let dirs = [a, b];

    let default = open_session(&root, &dirs);
    default
        .with_result(|result| {
            assert!(result.conflicts.contains("localisation/english-yml", "greeting"));
        })
        .unwrap();

    for mode in [
        PatchStateMode::DefaultWithoutLocalization,
        PatchStateMode::AdvancedWithoutLocalization,
    ] {
        let session = open_session_in_mode(&root, &dirs, mode);
        session
            .with_result(|result| {
                assert!(!result.all_conflicts.contains("localisation/english-yml", "greeting"));
                assert!(!result.conflicts.contains("localisation/english-yml", "greeting"));
                assert!(result.conflicts.contains("events-txt", "x"));
            })
            .unwrap();
    }
}

#[test]
fn test_patch_entry_becomes_orphan_when_provider_is_dropped() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    let a = write_mod(&root, "A", &[("events/a.txt", "x = {\n\tvalue = a\n}\n")]);
    let b = write_mod(&root, "B", &[("events/b.txt", "x = {\n\tvalue = b\n}\n")]);

    let patch_dir = {
        let session = open_session(&root, &[a.clone(), b]);
        let candidates = session.candidates("events-txt", "x").unwrap();
        let winner = session.eval_definition_priority(&candidates).definition.unwrap();
        assert!(session.apply_mod_patch(&winner).unwrap());
        session.writer().patch_dir()
    };

    let session = open_session(&root, &[a, patch_dir.clone()]);
    session
        .with_result(|result| {
            assert!(!result.all_conflicts.contains("events-txt", "x"));
            assert!(!result.resolved_conflicts.contains("events-txt", "x"));
            let orphans = result.orphan_conflicts.get_by_type_and_id("events-txt", "x");
            assert_eq!(orphans.len(), 1);
            assert_eq!(orphans[0].mod_name, "pdx_patch_test");
        })
        .unwrap();

    session.initialize_patch_state().unwrap();
    assert_eq!(session.summary().unwrap().orphans, 1);
    assert!(patch_dir.join("events/zzz_b.txt").exists());
}
