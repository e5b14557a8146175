//! Helpers for writing synthetic dumps in tests.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::{io::Cursor, sync::Arc};

use crate::dump_parser::{Contributor, PageInfo, RevisionRecord};

pub mod prelude {
    pub(crate) use super::{dummy_revision, dump_to_xml, TestPage};
    pub(crate) use proptest::prelude::*;
}

pub fn dummy_revision() -> RevisionRecord {
    RevisionRecord {
        id: Some(0),
        timestamp: chrono::DateTime::from_timestamp(0, 0),
        contributor: Contributor {
            id: None,
            ip: None,
            username: Some("Dummy".into()),
        },
        comment: None,
        minor: false,
        text: None,
        page: Arc::new(PageInfo::default()),
    }
}

#[derive(Debug, Clone)]
pub struct TestRevision {
    pub id: u64,
    pub text: Option<String>,
    pub username: Option<String>,
    pub ip: Option<String>,
    pub user_id: Option<u64>,
    pub comment: Option<String>,
    pub minor: bool,
}

impl TestRevision {
    pub fn new(id: u64, text: Option<&str>) -> Self {
        Self {
            id,
            text: text.map(str::to_string),
            username: Some(format!("User{}", id % 7)),
            ip: None,
            user_id: Some(id % 7),
            comment: None,
            minor: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestPage {
    pub id: u64,
    pub title: String,
    pub namespace: i32,
    pub revisions: Vec<TestRevision>,
}

impl TestPage {
    /// A page whose revisions carry the given texts, with revision ids ascending.
    pub fn new<S: AsRef<str>>(id: u64, texts: impl IntoIterator<Item = S>) -> Self {
        let revisions = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| TestRevision::new(id * 10_000 + i as u64 + 1, Some(text.as_ref())))
            .collect();
        Self {
            id,
            title: format!("Page {id}"),
            namespace: 0,
            revisions,
        }
    }
}

fn write_element(writer: &mut quick_xml::Writer<Cursor<&mut Vec<u8>>>, name: &str, text: &str) {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .unwrap();
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .unwrap();
    writer.write_event(Event::End(BytesEnd::new(name))).unwrap();
}

/// Serialize pages as a complete MediaWiki export document (with siteinfo).
pub fn dump_to_xml(pages: &[TestPage]) -> String {
    // Source: https://github.com/mediawiki-utilities/python-mwtypes/blob/523a93f98fe1372938fc15872b5abb1f267cc643/mwtypes/timestamp.py#L12
    const TIMESTAMP_FORMAT_LONG: &str = "%Y-%m-%dT%H:%M:%SZ";

    let mut xml = Vec::new();
    let mut writer = quick_xml::Writer::new(Cursor::new(&mut xml));

    writer
        .write_event(Event::Start(BytesStart::new("mediawiki").with_attributes([
            ("xmlns", "http://www.mediawiki.org/xml/export-0.11/"),
            ("version", "0.11"),
        ])))
        .unwrap();
    writer
        .write_event(Event::Start(BytesStart::new("siteinfo")))
        .unwrap();
    write_element(&mut writer, "dbname", "testwiki");
    writer
        .write_event(Event::Start(BytesStart::new("namespaces")))
        .unwrap();
    writer
        .write_event(Event::Empty(
            BytesStart::new("namespace").with_attributes([("key", "0")]),
        ))
        .unwrap();
    writer
        .write_event(Event::End(BytesEnd::new("namespaces")))
        .unwrap();
    writer
        .write_event(Event::End(BytesEnd::new("siteinfo")))
        .unwrap();

    for page in pages {
        writer
            .write_event(Event::Start(BytesStart::new("page")))
            .unwrap();
        write_element(&mut writer, "title", &page.title);
        write_element(&mut writer, "ns", &page.namespace.to_string());
        write_element(&mut writer, "id", &page.id.to_string());

        for (i, revision) in page.revisions.iter().enumerate() {
            writer
                .write_event(Event::Start(BytesStart::new("revision")))
                .unwrap();
            write_element(&mut writer, "id", &revision.id.to_string());

            let timestamp = chrono::DateTime::from_timestamp(1_000_000_000 + i as i64 * 60, 0)
                .unwrap()
                .format(TIMESTAMP_FORMAT_LONG)
                .to_string();
            write_element(&mut writer, "timestamp", &timestamp);

            writer
                .write_event(Event::Start(BytesStart::new("contributor")))
                .unwrap();
            if let Some(username) = &revision.username {
                write_element(&mut writer, "username", username);
            }
            if let Some(user_id) = revision.user_id {
                write_element(&mut writer, "id", &user_id.to_string());
            }
            if let Some(ip) = &revision.ip {
                write_element(&mut writer, "ip", ip);
            }
            writer
                .write_event(Event::End(BytesEnd::new("contributor")))
                .unwrap();

            if revision.minor {
                writer
                    .write_event(Event::Empty(BytesStart::new("minor")))
                    .unwrap();
            }
            if let Some(comment) = &revision.comment {
                write_element(&mut writer, "comment", comment);
            }

            match &revision.text {
                Some(text) => write_element(&mut writer, "text", text),
                None => writer
                    .write_event(Event::Empty(
                        BytesStart::new("text").with_attributes([("deleted", "deleted")]),
                    ))
                    .unwrap(),
            }

            writer
                .write_event(Event::End(BytesEnd::new("revision")))
                .unwrap();
        }

        writer
            .write_event(Event::End(BytesEnd::new("page")))
            .unwrap();
    }

    writer
        .write_event(Event::End(BytesEnd::new("mediawiki")))
        .unwrap();

    String::from_utf8(xml).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump_parser::DumpReader;

    #[test]
    fn test_generated_dump_reads_back() {
        let mut page = TestPage::new(3, ["One & two.", "Three <four>."]);
        page.revisions[1].minor = true;
        page.revisions[1].comment = Some("fix".to_string());
        page.revisions[1].ip = Some("2001:db8::1".to_string());
        page.revisions[1].user_id = None;
        page.revisions[1].username = None;
        page.revisions.push(TestRevision::new(30_003, None));

        let xml = dump_to_xml(&[page]);
        let revisions: Vec<_> = DumpReader::new(xml.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(revisions.len(), 3);
        assert_eq!(revisions[0].text.as_deref(), Some("One & two."));
        assert_eq!(revisions[0].contributor.id, Some(30_001 % 7));
        assert_eq!(revisions[1].text.as_deref(), Some("Three <four>."));
        assert!(revisions[1].minor);
        assert_eq!(revisions[1].comment.as_deref(), Some("fix"));
        assert_eq!(revisions[1].contributor.ip.as_deref(), Some("2001:db8::1"));
        assert_eq!(revisions[2].text, None);
        assert!(revisions.iter().all(|r| r.page.id == Some(3)));
    }
}
