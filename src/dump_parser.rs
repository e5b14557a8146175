use std::{
    any::type_name_of_val,
    borrow::Cow,
    fmt::{Debug, Display},
    io::BufRead,
    iter::FusedIterator,
    sync::Arc,
};

use compact_str::CompactString;
use quick_xml::events::{BytesStart, Event};

// we normally don't retrieve the value of the tags, so this is the most efficient backend
type TagStringInterner = string_interner::StringInterner<string_interner::backend::BucketBackend>;

// list of all tags that are relevant for our use case
// all other tags are only tracked to keep the element stack balanced
#[derive(Clone, PartialEq, Eq)]
enum Tag {
    Page,        // <page>...tags are (title, ns, id, revision)</page>
    Title,       // <title>blah</title>
    Ns,          // <ns>0</ns>
    Id,          // <id>500</id> - used for page, revision and contributor alike
    Revision,    // <revision>...tags are (id, timestamp, contributor, minor, comment, text)</revision>
    Timestamp,   // <timestamp>2003-12-05T06:41:50Z</timestamp>
    Contributor, // <contributor><username>blah</username><id>500</id></contributor> or <contributor><ip>1.2.3.4</ip></contributor>
    Username,    // <username>blah</username>
    Ip,          // <ip>1.2.3.4</ip>
    Comment,     // <comment>blah</comment>
    Minor,       // <minor />
    Text { deleted: bool }, // <text bytes="20">blah</text> or <text bytes="20" deleted="deleted" />
    Unknown(string_interner::DefaultSymbol), // any other tag
}

impl Tag {
    fn name<'a>(&self, tag_interner: &'a TagStringInterner) -> &'a str {
        match self {
            Tag::Page => "page",
            Tag::Title => "title",
            Tag::Ns => "ns",
            Tag::Id => "id",
            Tag::Revision => "revision",
            Tag::Timestamp => "timestamp",
            Tag::Contributor => "contributor",
            Tag::Username => "username",
            Tag::Ip => "ip",
            Tag::Comment => "comment",
            Tag::Minor => "minor",
            Tag::Text { .. } => "text",
            Tag::Unknown(symbol) => tag_interner.resolve(*symbol).unwrap_or("?"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum TagReadingError<T> {
    /// Error returned to indicate that the input is not valid UTF-8.
    ///
    /// Allows continuing to parse the XML file, all such tags share one placeholder name.
    #[error("non-UTF-8 tag detected")]
    NonUtf8Tag(T),
    #[error("XML error")]
    XmlError(#[from] quick_xml::Error),
}

impl Tag {
    // matched on the local name so that `<mw:page>` and `<page xmlns="...">` read the same
    fn from_start_bytes(
        e: &BytesStart,
        tag_interner: &mut TagStringInterner,
    ) -> Result<Self, TagReadingError<Tag>> {
        match e.local_name().as_ref() {
            b"page" => Ok(Tag::Page),
            b"title" => Ok(Tag::Title),
            b"ns" => Ok(Tag::Ns),
            b"id" => Ok(Tag::Id),
            b"revision" => Ok(Tag::Revision),
            b"timestamp" => Ok(Tag::Timestamp),
            b"contributor" => Ok(Tag::Contributor),
            b"username" => Ok(Tag::Username),
            b"ip" => Ok(Tag::Ip),
            b"comment" => Ok(Tag::Comment),
            b"minor" => Ok(Tag::Minor),
            b"text" => {
                let mut deleted = false;

                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    if attr.key.local_name().as_ref() == b"deleted" {
                        deleted = true;
                    }
                }

                Ok(Tag::Text { deleted })
            }
            name => {
                if let Ok(name) = std::str::from_utf8(name) {
                    Ok(Tag::Unknown(tag_interner.get_or_intern(name)))
                } else {
                    Err(TagReadingError::NonUtf8Tag(Tag::Unknown(
                        tag_interner.get_or_intern("non-utf8 tag"),
                    )))
                }
            }
        }
    }
}

/// Who saved a revision.
///
/// Registered users carry an `id` (and usually a `username`), anonymous edits an `ip`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Contributor {
    pub id: Option<u64>,
    pub ip: Option<CompactString>,
    pub username: Option<CompactString>,
}

impl Contributor {
    /// The user id if known, otherwise the ip address.
    pub fn uid(&self) -> Option<Cow<'_, str>> {
        match (&self.id, &self.ip) {
            (Some(id), _) => Some(Cow::Owned(id.to_string())),
            (None, Some(ip)) => Some(Cow::Borrowed(ip.as_str())),
            (None, None) => None,
        }
    }
}

/// Page header shared by every revision of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PageInfo {
    pub id: Option<u64>,
    pub title: CompactString,
    pub namespace: Option<i32>,
}

/// One `<revision>` element of the dump.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionRecord {
    pub id: Option<u64>,
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    // aka. user
    pub contributor: Contributor,
    pub comment: Option<CompactString>,
    pub minor: bool,
    /// `None` if the revision has no text body (e.g. revision-deleted content).
    pub text: Option<String>,
    pub page: Arc<PageInfo>,
}

impl RevisionRecord {
    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }
}

#[derive(Debug, Default)]
struct PageBuilder {
    id: Option<u64>,
    title: CompactString,
    namespace: Option<i32>,
    // handed out to every revision of the page; dropped whenever a field changes
    shared: Option<Arc<PageInfo>>,
}

impl PageBuilder {
    fn set_id(&mut self, id: Option<u64>) {
        self.id = id;
        self.shared = None;
    }

    fn set_title(&mut self, title: CompactString) {
        self.title = title;
        self.shared = None;
    }

    fn set_namespace(&mut self, namespace: Option<i32>) {
        self.namespace = namespace;
        self.shared = None;
    }

    fn shared(&mut self) -> Arc<PageInfo> {
        self.shared
            .get_or_insert_with(|| {
                Arc::new(PageInfo {
                    id: self.id,
                    title: self.title.clone(),
                    namespace: self.namespace,
                })
            })
            .clone()
    }
}

#[derive(Debug, Default)]
struct RevisionBuilder {
    id: Option<u64>,
    timestamp: Option<chrono::DateTime<chrono::Utc>>,
    contributor: Option<Contributor>,
    comment: Option<CompactString>,
    text: Option<String>,
    minor: bool,
}

impl RevisionBuilder {
    fn build(self, page: Arc<PageInfo>) -> RevisionRecord {
        RevisionRecord {
            id: self.id,
            timestamp: self.timestamp,
            contributor: self.contributor.unwrap_or_default(),
            comment: self.comment,
            minor: self.minor,
            text: self.text,
            page,
        }
    }
}

/// Which entity an `<id>` element belongs to.
///
/// The export schema reuses the `id` tag for the page, the revision and the contributor.
/// Their relative order is fixed, so the owner is derived from how many ids were already
/// seen since the last page/revision boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdSlot {
    Page,
    Revision,
    Contributor,
    /// All slots filled - the schema assumption does not hold.
    Unexpected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct IdSlots {
    page_id_seen: bool,
    revision_id_seen: bool,
    contributor_id_seen: bool,
}

impl IdSlots {
    pub(crate) fn claim(&mut self) -> IdSlot {
        if !self.page_id_seen {
            self.page_id_seen = true;
            IdSlot::Page
        } else if !self.revision_id_seen {
            self.revision_id_seen = true;
            IdSlot::Revision
        } else if !self.contributor_id_seen {
            self.contributor_id_seen = true;
            IdSlot::Contributor
        } else {
            IdSlot::Unexpected
        }
    }

    /// Entering a new page frees all slots.
    pub(crate) fn reset_page(&mut self) {
        *self = Self::default();
    }

    /// Finishing a revision frees the revision and contributor slots, the page keeps its id.
    pub(crate) fn reset_revision(&mut self) {
        self.revision_id_seen = false;
        self.contributor_id_seen = false;
    }
}

/// Where in the dump an error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamContext {
    /// Byte offset of the XML parser.
    pub position: u64,
    pub last_page_id: Option<u64>,
    pub last_revision_id: Option<u64>,
}

impl Display for StreamContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "byte {}", self.position)?;
        match self.last_page_id {
            Some(id) => write!(f, ", last page id {id}")?,
            None => write!(f, ", no page id read yet")?,
        }
        match self.last_revision_id {
            Some(id) => write!(f, ", last revision id {id}"),
            None => write!(f, ", no revision read yet"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("XML error at {context}")]
    Xml {
        #[source]
        source: quick_xml::Error,
        context: StreamContext,
    },
    #[error("unexpected end of file inside <{open_tag}> at {context}")]
    UnexpectedEof {
        open_tag: String,
        context: StreamContext,
    },
    /// Only produced with the `strict` feature, otherwise the id is dropped.
    #[error("unexpected <id> element, page, revision and contributor ids are already set at {context}")]
    UnexpectedId { context: StreamContext },
}

impl DumpError {
    pub fn context(&self) -> &StreamContext {
        match self {
            DumpError::Xml { context, .. } => context,
            DumpError::UnexpectedEof { context, .. } => context,
            DumpError::UnexpectedId { context } => context,
        }
    }
}

#[derive(Debug)]
struct NonUtf8Reporter {
    num_tags: usize,
}

impl NonUtf8Reporter {
    fn new() -> Self {
        Self { num_tags: 0 }
    }

    fn register(&mut self, name: &[u8]) {
        self.num_tags += 1;

        if self.num_tags == 1 {
            tracing::warn!(message = "Non-UTF-8 tag in XML detected. This is not expected. Parsing will continue, but the results may be incorrect. Further non-UTF-8 tags will not be reported.", name = String::from_utf8_lossy(name).as_ref());
        }
    }

    fn tag_from_start_bytes(
        &mut self,
        e: &BytesStart,
        tag_interner: &mut TagStringInterner,
    ) -> Result<Tag, quick_xml::Error> {
        match Tag::from_start_bytes(e, tag_interner) {
            Ok(tag) => Ok(tag),
            Err(TagReadingError::NonUtf8Tag(tag)) => {
                self.register(e.name().as_ref());
                Ok(tag)
            }
            Err(TagReadingError::XmlError(e)) => Err(e),
        }
    }
}

// what the last XML event asks the reader to do, detached from the event buffer
enum Step {
    Open(Tag),
    OpenClose(Tag),
    Close,
    Eof,
    Skip,
}

/// Streaming reader over a MediaWiki XML export.
///
/// Yields one [`RevisionRecord`] per `<revision>` element in document order. Only the
/// revision currently being read is held in memory, so the dump size is not limited by RAM.
///
/// After the first error the iterator is exhausted. Dropping the reader drops the underlying
/// source, which is how a consumer stops early.
pub struct DumpReader<R: BufRead> {
    tag_interner: TagStringInterner,
    xml_parser: quick_xml::Reader<R>,
    buf: Vec<u8>,
    current_path: Vec<Tag>,
    // character data of the innermost open element
    text_buf: String,
    page: PageBuilder,
    revision: RevisionBuilder,
    contributor: Contributor,
    id_slots: IdSlots,
    last_page_id: Option<u64>,
    last_revision_id: Option<u64>,
    non_utf8_reporter: NonUtf8Reporter,
    finished: bool,
}

impl<R: BufRead> Debug for DumpReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpReader")
            .field("xml_parser", &type_name_of_val(&self.xml_parser))
            // print buffer length and capacity
            .field("buf.len", &self.buf.len())
            .field("buf.capacity", &self.buf.capacity())
            .field("current_path", &self.path_names())
            .field("last_page_id", &self.last_page_id)
            .field("last_revision_id", &self.last_revision_id)
            .field("finished", &self.finished)
            .finish()
    }
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(reader: R) -> Self {
        let xml_parser = quick_xml::Reader::from_reader(reader);
        // expand_empty_elements not set, empty elements are handled as open + close

        Self {
            tag_interner: TagStringInterner::new(),
            xml_parser,
            // preallocate 1 MiB for the buffer
            buf: Vec::with_capacity(1024 * 1024),
            current_path: Vec::new(),
            text_buf: String::new(),
            page: PageBuilder::default(),
            revision: RevisionBuilder::default(),
            contributor: Contributor::default(),
            id_slots: IdSlots::default(),
            last_page_id: None,
            last_revision_id: None,
            non_utf8_reporter: NonUtf8Reporter::new(),
            finished: false,
        }
    }

    pub fn context(&self) -> StreamContext {
        StreamContext {
            position: self.xml_parser.buffer_position() as u64,
            last_page_id: self.last_page_id,
            last_revision_id: self.last_revision_id,
        }
    }

    fn path_names(&self) -> Vec<&str> {
        self.current_path
            .iter()
            .map(|tag| tag.name(&self.tag_interner))
            .collect()
    }

    fn xml_error(&self, source: quick_xml::Error) -> DumpError {
        let context = self.context();
        tracing::error!(message = "Aborting parsing due to XML error", error = %source, position = context.position, path = ?self.path_names());
        DumpError::Xml { source, context }
    }

    fn next_step(&mut self) -> Result<Step, DumpError> {
        // only field-level borrows while the event is alive, it points into `self.buf`
        let step = match self.xml_parser.read_event_into(&mut self.buf) {
            Ok(Event::Start(ref e)) => self
                .non_utf8_reporter
                .tag_from_start_bytes(e, &mut self.tag_interner)
                .map(Step::Open),
            Ok(Event::Empty(ref e)) => self
                .non_utf8_reporter
                .tag_from_start_bytes(e, &mut self.tag_interner)
                .map(Step::OpenClose),
            Ok(Event::End(_)) => Ok(Step::Close),
            Ok(Event::Text(ref e)) => e.unescape().map(|text| {
                self.text_buf.push_str(&text);
                Step::Skip
            }),
            Ok(Event::CData(ref e)) => {
                self.text_buf.push_str(&String::from_utf8_lossy(e));
                Ok(Step::Skip)
            }
            Ok(Event::Eof) => Ok(Step::Eof),
            Ok(_) => Ok(Step::Skip),
            Err(err) => Err(err),
        };
        self.buf.clear();
        step.map_err(|err| self.xml_error(err))
    }

    fn read_revision(&mut self) -> Result<Option<RevisionRecord>, DumpError> {
        loop {
            match self.next_step()? {
                Step::Open(tag) => self.open(tag),
                Step::OpenClose(tag) => {
                    self.open(tag);
                    if let Some(revision) = self.close()? {
                        return Ok(Some(revision));
                    }
                }
                Step::Close => {
                    if let Some(revision) = self.close()? {
                        return Ok(Some(revision));
                    }
                }
                Step::Eof => {
                    return if let Some(open_tag) = self.current_path.last() {
                        let open_tag = open_tag.name(&self.tag_interner).to_string();
                        let context = self.context();
                        tracing::error!(message = "Unexpected end of file", open_tag, path = ?self.path_names(), position = context.position);
                        Err(DumpError::UnexpectedEof { open_tag, context })
                    } else {
                        Ok(None)
                    };
                }
                Step::Skip => {}
            }
        }
    }

    fn open(&mut self, tag: Tag) {
        self.text_buf.clear();

        if tag == Tag::Page {
            self.page = PageBuilder::default();
            self.revision = RevisionBuilder::default();
            self.contributor = Contributor::default();
            self.id_slots.reset_page();
        }

        self.current_path.push(tag);
    }

    fn close(&mut self) -> Result<Option<RevisionRecord>, DumpError> {
        // quick-xml checks that end tags match, so the stack can't underflow on valid input
        let Some(tag) = self.current_path.pop() else {
            tracing::warn!(message = "Ignoring unexpected end tag", position = self.xml_parser.buffer_position());
            return Ok(None);
        };
        let text = std::mem::take(&mut self.text_buf);

        match tag {
            Tag::Id => match self.id_slots.claim() {
                IdSlot::Page => {
                    let id = self.parse_id(&text, "page");
                    self.page.set_id(id);
                    if id.is_some() {
                        self.last_page_id = id;
                    }
                }
                IdSlot::Revision => self.revision.id = self.parse_id(&text, "revision"),
                IdSlot::Contributor => self.contributor.id = self.parse_id(&text, "contributor"),
                IdSlot::Unexpected => {
                    let context = self.context();
                    tracing::warn!(
                        message = "Found <id> after page, revision and contributor ids, dropping it",
                        id = text.as_str(),
                        path = ?self.path_names(),
                        position = context.position
                    );
                    if cfg!(feature = "strict") {
                        return Err(DumpError::UnexpectedId { context });
                    }
                }
            },
            Tag::Username => self.contributor.username = Some(CompactString::from(text)),
            Tag::Ip => self.contributor.ip = Some(CompactString::from(text)),
            Tag::Contributor => {
                self.revision.contributor = Some(std::mem::take(&mut self.contributor));
            }
            Tag::Revision => {
                let page = self.page.shared();
                let revision = std::mem::take(&mut self.revision).build(page);
                self.contributor = Contributor::default();
                self.id_slots.reset_revision();
                if revision.id.is_some() {
                    self.last_revision_id = revision.id;
                }
                return Ok(Some(revision));
            }
            Tag::Title => self.page.set_title(CompactString::from(text)),
            Tag::Ns => {
                let namespace = match text.trim().parse() {
                    Ok(ns) => Some(ns),
                    Err(_) => {
                        tracing::warn!(
                            message = "Found invalid namespace id",
                            ns = text.as_str(),
                            position = self.xml_parser.buffer_position()
                        );
                        None
                    }
                };
                self.page.set_namespace(namespace);
            }
            Tag::Timestamp => self.revision.timestamp = self.parse_timestamp(&text),
            // <comment deleted="deleted"/> and <comment/> carry no summary
            Tag::Comment => {
                self.revision.comment = (!text.is_empty()).then(|| CompactString::from(text));
            }
            Tag::Minor => self.revision.minor = true,
            Tag::Text { deleted } => {
                self.revision.text = if deleted { None } else { Some(text) };
            }
            // the page header stays around until the next <page> opens
            Tag::Page | Tag::Unknown(_) => {}
        }

        Ok(None)
    }

    fn parse_id(&self, text: &str, field: &'static str) -> Option<u64> {
        match text.trim().parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(
                    message = "Found invalid id",
                    field,
                    id = text,
                    position = self.xml_parser.buffer_position()
                );
                None
            }
        }
    }

    fn parse_timestamp(&self, text: &str) -> Option<chrono::DateTime<chrono::Utc>> {
        // Source: https://github.com/mediawiki-utilities/python-mwtypes/blob/523a93f98fe1372938fc15872b5abb1f267cc643/mwtypes/timestamp.py#L12
        const TIMESTAMP_FORMAT_LONG: &str = "%Y-%m-%dT%H:%M:%SZ";
        const TIMESTAMP_FORMAT_SHORT: &str = "%Y%m%d%H%M%S";

        let text = text.trim();
        match chrono::NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT_LONG)
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT_SHORT))
        {
            Ok(dt) => Some(chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc)),
            Err(_) => {
                tracing::warn!(
                    message = "Found invalid revision timestamp",
                    timestamp = text,
                    position = self.xml_parser.buffer_position()
                );
                None
            }
        }
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<RevisionRecord, DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_revision() {
            Ok(Some(revision)) => Some(Ok(revision)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for DumpReader<R> {}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.11/" version="0.11" xml:lang="en">
  <siteinfo>
    <sitename>Wikipedia</sitename>
    <dbname>enwiki</dbname>
    <namespaces>
      <namespace key="0" case="first-letter" />
      <namespace key="1" case="first-letter">Talk</namespace>
    </namespaces>
  </siteinfo>
  <page>
    <title>Cat</title>
    <ns>0</ns>
    <id>10</id>
    <revision>
      <id>100</id>
      <timestamp>2003-12-05T06:41:50Z</timestamp>
      <contributor>
        <username>Alice</username>
        <id>7</id>
      </contributor>
      <comment>first</comment>
      <text bytes="18">The cat sat &amp; purred.</text>
    </revision>
    <revision>
      <id>101</id>
      <timestamp>2003-12-06T06:41:50Z</timestamp>
      <contributor>
        <ip>192.0.2.1</ip>
      </contributor>
      <minor />
      <text bytes="0" />
    </revision>
  </page>
  <page>
    <title>Dog</title>
    <ns>1</ns>
    <id>11</id>
    <revision>
      <id>200</id>
      <timestamp>20040101000000</timestamp>
      <contributor deleted="deleted" />
      <text deleted="deleted" />
    </revision>
  </page>
</mediawiki>"#;

    fn read_all(xml: &str) -> Vec<Result<RevisionRecord, DumpError>> {
        DumpReader::new(xml.as_bytes()).collect()
    }

    #[test]
    fn test_reads_revisions_in_document_order() {
        let revisions: Vec<_> = read_all(DUMP).into_iter().map(Result::unwrap).collect();
        assert_eq!(revisions.len(), 3);

        let first = &revisions[0];
        assert_eq!(first.id, Some(100));
        assert_eq!(first.page.id, Some(10));
        assert_eq!(first.page.title, "Cat");
        assert_eq!(first.page.namespace, Some(0));
        assert_eq!(first.contributor.username.as_deref(), Some("Alice"));
        assert_eq!(first.contributor.id, Some(7));
        assert_eq!(first.comment.as_deref(), Some("first"));
        assert!(!first.minor);
        assert_eq!(first.text.as_deref(), Some("The cat sat & purred."));
        assert_eq!(
            first.timestamp.map(|t| t.to_rfc3339()),
            Some("2003-12-05T06:41:50+00:00".to_string())
        );

        let second = &revisions[1];
        assert_eq!(second.id, Some(101));
        assert!(second.minor);
        assert_eq!(second.contributor.ip.as_deref(), Some("192.0.2.1"));
        assert_eq!(second.contributor.id, None);
        assert_eq!(second.contributor.uid().as_deref(), Some("192.0.2.1"));
        assert_eq!(second.text.as_deref(), Some(""));
        assert_eq!(second.comment, None);

        let third = &revisions[2];
        assert_eq!(third.page.id, Some(11));
        assert_eq!(third.page.title, "Dog");
        assert_eq!(third.id, Some(200));
        assert_eq!(third.text, None);
        assert!(third.timestamp.is_some());
        assert_eq!(third.contributor, Contributor::default());
    }

    #[test]
    fn test_page_header_is_shared_between_revisions() {
        let revisions: Vec<_> = read_all(DUMP).into_iter().map(Result::unwrap).collect();
        assert!(Arc::ptr_eq(&revisions[0].page, &revisions[1].page));
        assert!(!Arc::ptr_eq(&revisions[1].page, &revisions[2].page));
    }

    #[test]
    fn test_id_slots_assign_by_position() {
        let mut slots = IdSlots::default();
        assert_eq!(slots.claim(), IdSlot::Page);
        assert_eq!(slots.claim(), IdSlot::Revision);
        assert_eq!(slots.claim(), IdSlot::Contributor);
        assert_eq!(slots.claim(), IdSlot::Unexpected);

        slots.reset_revision();
        assert_eq!(slots.claim(), IdSlot::Revision);
        assert_eq!(slots.claim(), IdSlot::Contributor);

        slots.reset_page();
        assert_eq!(slots.claim(), IdSlot::Page);
    }

    #[cfg(not(feature = "strict"))]
    #[test]
    fn test_fourth_id_is_dropped() {
        let xml = r#"<mediawiki><page><title>A</title><id>1</id>
            <revision><id>2</id><contributor><username>u</username><id>3</id></contributor>
            <id>4</id><text>body</text></revision></page></mediawiki>"#;
        let revisions: Vec<_> = read_all(xml).into_iter().map(Result::unwrap).collect();
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].page.id, Some(1));
        assert_eq!(revisions[0].id, Some(2));
        assert_eq!(revisions[0].contributor.id, Some(3));
        assert_eq!(revisions[0].text.as_deref(), Some("body"));
    }

    #[cfg(feature = "strict")]
    #[test]
    fn test_fourth_id_is_an_error_in_strict_mode() {
        let xml = r#"<mediawiki><page><title>A</title><id>1</id>
            <revision><id>2</id><contributor><ip>x</ip></contributor><id>3</id><id>4</id>
            </revision></page></mediawiki>"#;
        let results = read_all(xml);
        assert!(matches!(results.last(), Some(Err(DumpError::UnexpectedId { .. }))));
    }

    #[test]
    fn test_invalid_id_is_none() {
        let xml = r#"<mediawiki><page><title>A</title><id>abc</id>
            <revision><id>2</id><timestamp>yesterday</timestamp><text>x</text></revision></page></mediawiki>"#;
        let revisions: Vec<_> = read_all(xml).into_iter().map(Result::unwrap).collect();
        assert_eq!(revisions[0].page.id, None);
        assert_eq!(revisions[0].id, Some(2));
        assert_eq!(revisions[0].timestamp, None);
    }

    #[test]
    fn test_namespaced_tags() {
        let xml = r#"<mw:mediawiki xmlns:mw="http://www.mediawiki.org/xml/export-0.11/">
            <mw:page><mw:title>A</mw:title><mw:id>5</mw:id>
            <mw:revision><mw:id>6</mw:id><mw:text>hello</mw:text></mw:revision>
            </mw:page></mw:mediawiki>"#;
        let revisions: Vec<_> = read_all(xml).into_iter().map(Result::unwrap).collect();
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].page.id, Some(5));
        assert_eq!(revisions[0].id, Some(6));
        assert_eq!(revisions[0].text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_deleted_or_empty_comment_is_none() {
        let xml = r#"<mediawiki><page><title>A</title><id>5</id>
            <revision><id>6</id><comment deleted="deleted" /><text>a</text></revision>
            <revision><id>7</id><comment/><text>b</text></revision>
            <revision><id>8</id><comment></comment><text>c</text></revision>
            <revision><id>9</id><comment>typo</comment><text>d</text></revision>
            </page></mediawiki>"#;
        let comments: Vec<_> = read_all(xml)
            .into_iter()
            .map(|revision| revision.unwrap().comment)
            .collect();
        assert_eq!(comments, vec![None, None, None, Some("typo".into())]);
    }

    #[test]
    fn test_cdata_text() {
        let xml = r#"<mediawiki><page><title>A</title><id>5</id>
            <revision><id>6</id><text><![CDATA[a <b> c]]></text></revision>
            </page></mediawiki>"#;
        let revisions: Vec<_> = read_all(xml).into_iter().map(Result::unwrap).collect();
        assert_eq!(revisions[0].text.as_deref(), Some("a <b> c"));
    }

    #[test]
    fn test_malformed_xml_stops_after_partial_output() {
        let xml = r#"<mediawiki><page><title>A</title><id>5</id>
            <revision><id>6</id><text>one</text></revision>
            <revision><id>7</id><text>two</txet></revision>
            </page></mediawiki>"#;
        let mut reader = DumpReader::new(xml.as_bytes());

        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.id, Some(6));

        match reader.next() {
            Some(Err(DumpError::Xml { context, .. })) => {
                assert_eq!(context.last_page_id, Some(5));
                assert_eq!(context.last_revision_id, Some(6));
                assert!(context.position > 0);
            }
            other => panic!("expected an XML error, got {other:?}"),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_truncated_dump_is_an_error() {
        let xml = r#"<mediawiki><page><title>A</title><id>5</id>
            <revision><id>6</id><text>one</text></revision>
            <revision><id>7</id><text>tw"#;
        let results = read_all(xml);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(DumpError::UnexpectedEof { open_tag, .. }) => assert_eq!(open_tag, "text"),
            other => panic!("expected eof error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_dump() {
        assert!(read_all("<mediawiki></mediawiki>").is_empty());
        assert!(read_all("").is_empty());
    }

    #[test]
    fn test_error_display_names_position() {
        let xml = "<mediawiki><page><title>A</title><id>5</id><revision>";
        let results = read_all(xml);
        let message = results.last().unwrap().as_ref().unwrap_err().to_string();
        assert!(message.contains("last page id 5"), "{message}");
        assert!(message.contains("no revision read yet"), "{message}");
    }
}
