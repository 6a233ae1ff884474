//! Session behavior across reloads and between sessions

use lje_common::config::DataSources;
use lje_common::lists::CUSTOM_LIST;
use lje_common::session::{EditEvent, EditOutcome, ViewOptions};
use lje_common::{ExplorerSession, Field, SessionSettings};
use std::fs;
use tempfile::TempDir;

fn write_sources(dir: &TempDir, discs: &str, titles: &str) {
    fs::write(dir.path().join("discs.csv"), discs).unwrap();
    fs::write(dir.path().join("titles.csv"), titles).unwrap();
}

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_sources(
        &dir,
        "REFERENCE,YEAR,COUNTRY\nR1,1990,US\nR2,1991,UK\nR3,1992,US\n",
        "REFERENCE,ARTIST,TITLE\nR1,Abba,Waterloo\nR2,Blondie,Atomic\nR3,Cher,Believe\n",
    );
    dir
}

fn open(dir: &TempDir) -> ExplorerSession {
    ExplorerSession::open(DataSources::in_folder(dir.path()), SessionSettings::default()).unwrap()
}

fn stage_selected(session: &mut ExplorerSession, index: usize) -> Vec<String> {
    session.view(ViewOptions::default()).stages[index].selected.clone()
}

#[test]
fn test_reload_keeps_selections_and_prunes_vanished_values() {
    let dir = setup();
    let mut session = open(&dir);
    session
        .set_selection(Field::Artist, vec!["Abba".into(), "Cher".into()])
        .unwrap();
    assert_eq!(stage_selected(&mut session, 2), vec!["Abba", "Cher"]);

    // Cher disappears from the titles table
    write_sources(
        &dir,
        "REFERENCE,YEAR,COUNTRY\nR1,1990,US\nR2,1991,UK\n",
        "REFERENCE,ARTIST,TITLE\nR1,Abba,Waterloo\nR2,Blondie,Atomic\n",
    );
    session.reload().unwrap();

    let view = session.view(ViewOptions::default());
    assert_eq!(view.stages[2].selected, vec!["Abba"]);
    assert_eq!(view.rows.len(), 1);
    assert_eq!(session.cache().misses(), 4);
}

#[test]
fn test_reload_keeps_custom_list_and_drops_vanished_references() {
    let dir = setup();
    let mut session = open(&dir);
    session.paste_custom("R2\n");
    session.view(ViewOptions::default());

    session.reload().unwrap();
    assert_eq!(session.cache().hits(), 2);

    // R3 disappears; an edit sent from the old view is stale
    write_sources(
        &dir,
        "REFERENCE,YEAR,COUNTRY\nR1,1990,US\nR2,1991,UK\n",
        "REFERENCE,ARTIST,TITLE\nR1,Abba,Waterloo\nR2,Blondie,Atomic\n",
    );
    session.reload().unwrap();

    let edit = |reference: &str| EditEvent {
        reference: reference.into(),
        list: CUSTOM_LIST.into(),
        included: true,
    };
    let outcomes = session.apply_edits(vec![edit("R3"), edit("R1")]);
    assert_eq!(outcomes, vec![EditOutcome::Stale, EditOutcome::Applied]);

    session.set_restriction(vec![CUSTOM_LIST.into()]);
    let view = session.view(ViewOptions::default());
    let refs: Vec<_> = view.rows.iter().map(|r| r.record.reference.as_str()).collect();
    assert_eq!(refs, vec!["R2", "R1"]);
}

#[test]
fn test_reload_reuses_unchanged_list_files() {
    let dir = setup();
    fs::create_dir(dir.path().join("lists")).unwrap();
    fs::write(dir.path().join("lists").join("owned.csv"), "REFERENCE\nR1\n").unwrap();
    let mut session = open(&dir);
    assert_eq!(session.cache().misses(), 3);

    session.reload().unwrap();
    assert_eq!((session.cache().hits(), session.cache().misses()), (3, 3));

    fs::write(dir.path().join("lists").join("owned.csv"), "REFERENCE\nR1\nR3\n").unwrap();
    session.reload().unwrap();
    assert_eq!((session.cache().hits(), session.cache().misses()), (5, 4));
    let owned = session.lists().into_iter().find(|l| l.name == "Owned").unwrap();
    assert_eq!(owned.size, 2);
}

#[test]
fn test_sessions_do_not_share_lists_or_filters() {
    let dir = setup();
    let mut first = open(&dir);
    let mut second = open(&dir);

    first.paste_custom("R1\nR3\n");
    first.set_selection(Field::Country, vec!["US".into()]).unwrap();

    let custom_size = |s: &ExplorerSession| {
        s.lists()
            .into_iter()
            .find(|l| l.name == CUSTOM_LIST)
            .map(|l| l.size)
            .unwrap()
    };
    assert_eq!(custom_size(&first), 2);
    assert_eq!(custom_size(&second), 0);
    assert_eq!(first.view(ViewOptions::default()).rows.len(), 2);
    assert_eq!(second.view(ViewOptions::default()).rows.len(), 3);
}

#[test]
fn test_reload_with_missing_source_keeps_previous_state() {
    let dir = setup();
    let mut session = open(&dir);
    fs::remove_file(dir.path().join("titles.csv")).unwrap();

    assert!(session.reload().is_err());
    assert_eq!(session.view(ViewOptions::default()).rows.len(), 3);
}
