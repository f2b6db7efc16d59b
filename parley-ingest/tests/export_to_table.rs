//! Raw export to message table, end to end.

use parley_ingest::{
    normalize, parse_export, read_messages, read_messages_path, write_messages,
    write_messages_path, ActionMap, NameMap, NormalizeOptions, Platform, DOCUMENT_OMITTED,
};
use parley_test_utils::{ChatLog, Message, DISCORD_SAMPLE, WHATSAPP_SAMPLE};
use proptest::prelude::*;

fn texts(log: &ChatLog) -> Vec<&str> {
    log.iter().map(|m| m.text.as_str()).collect()
}

#[test]
fn test_whatsapp_sample_parses() {
    let log = parse_export(Platform::WhatsApp, WHATSAPP_SAMPLE).unwrap();
    assert_eq!(
        texts(&log),
        vec!["morning all", "hey\nhow was the trip?", DOCUMENT_OMITTED, "lol"]
    );
    assert_eq!(log.reply_gaps(), vec![0, 38, 260, 49_333]);
}

#[test]
fn test_discord_sample_parses() {
    let log = parse_export(Platform::Discord, DISCORD_SAMPLE).unwrap();
    let senders: Vec<&str> = log.iter().map(|m| m.sender.as_str()).collect();
    assert_eq!(senders, vec!["Ana", "Ben", "Ana"]);
    assert_eq!(texts(&log), vec!["morning all", "hey\nhow was the trip?", "lol"]);
}

#[test]
fn test_normalized_whatsapp_export() {
    let options = NormalizeOptions::new()
        .with_names(NameMap::new().with("Ben", "Benjamin"))
        .with_actions(ActionMap::new().with("lol", "laughs"));
    let log = normalize(parse_export(Platform::WhatsApp, WHATSAPP_SAMPLE).unwrap(), &options);

    assert_eq!(log.messages()[1].sender, "Benjamin");
    assert_eq!(log.messages()[3].text, "Benjamin laughs");
}

#[test]
fn test_table_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat.tsv");

    let log = parse_export(Platform::WhatsApp, WHATSAPP_SAMPLE).unwrap();
    write_messages_path(&path, &log).unwrap();
    let restored = read_messages_path(&path).unwrap();

    assert_eq!(restored, log);
}

#[test]
fn test_token_lengths_survive_the_table() {
    let log = ChatLog::new(
        parse_export(Platform::Discord, DISCORD_SAMPLE)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, m)| m.with_token_length(10 + i))
            .collect::<Vec<Message>>(),
    );

    let mut buffer = Vec::new();
    write_messages(&mut buffer, &log).unwrap();
    let restored = read_messages(buffer.as_slice()).unwrap();

    assert_eq!(restored.token_length_at(2).unwrap(), 12);
}

#[test]
fn test_missing_table_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_messages_path(&dir.path().join("absent.tsv")).unwrap_err();
    assert!(err.to_string().contains("absent.tsv"));
}

proptest! {
    #[test]
    fn prop_table_preserves_messages(log in parley_test_utils::arb_chat_log()) {
        let mut buffer = Vec::new();
        write_messages(&mut buffer, &log).unwrap();
        let restored = read_messages(buffer.as_slice()).unwrap();
        prop_assert_eq!(restored, log);
    }
}
