//! Streaming table extractor.
//!
//! Walks an HTML export token by token, collects the header row and pushes
//! every data row into the row queue. Workers are launched lazily, exactly
//! once, the first time the header row is known to be complete.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use quick_xml::Reader;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::Event;
use tokio::io::{AsyncBufRead, AsyncRead, BufReader, ReadBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ExtractError;
use crate::player::RawRow;
use crate::row_pool::RowPool;
use crate::workers::{RowSender, SendStatus};

const READ_BUFFER_BYTES: usize = 64 * 1024;
const ESCAPE_CHUNK_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Table,
    THead,
    TBody,
    Tr,
    Cell,
    Other,
}

impl Tag {
    fn from_name(name: &[u8]) -> Self {
        if name.eq_ignore_ascii_case(b"table") {
            Tag::Table
        } else if name.eq_ignore_ascii_case(b"thead") {
            Tag::THead
        } else if name.eq_ignore_ascii_case(b"tbody") {
            Tag::TBody
        } else if name.eq_ignore_ascii_case(b"tr") {
            Tag::Tr
        } else if name.eq_ignore_ascii_case(b"td") || name.eq_ignore_ascii_case(b"th") {
            Tag::Cell
        } else {
            Tag::Other
        }
    }
}

// Owned copy of the events the state machine cares about, so no borrow of the
// read buffer survives an await.
enum Token {
    Start(Tag),
    End(Tag),
    Empty(Tag),
    Text(String),
    Eof,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Header,
    Data,
}

/// Why the worker pool was launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchTrigger {
    BodyStart,
    HeaderRowEnd,
    TableEnd,
}

impl LaunchTrigger {
    fn label(self) -> &'static str {
        match self {
            LaunchTrigger::BodyStart => "tbody start",
            LaunchTrigger::HeaderRowEnd => "header row end",
            LaunchTrigger::TableEnd => "table end",
        }
    }
}

/// Result of a completed extraction.
#[derive(Debug)]
pub struct Extracted<P> {
    /// The header snapshot the workers were launched with.
    pub headers: Arc<[String]>,
    /// Whatever the launch callback returned, usually a worker pool handle.
    pub pool: P,
    pub trigger: LaunchTrigger,
    pub rows_enqueued: usize,
    pub rows_dropped: usize,
    /// Data rows seen before the header snapshot existed; these are discarded.
    pub rows_before_launch: usize,
}

/// Runs the extractor over `reader`. `launch` is called at most once, with the
/// frozen header snapshot, and must start consuming the row queue.
///
/// The row queue is closed on every return path.
pub async fn extract<R, F, P>(
    reader: R,
    queue: RowSender,
    row_pool: RowPool,
    cancel: CancellationToken,
    launch: F,
) -> Result<Extracted<P>, ExtractError>
where
    R: AsyncRead + Unpin,
    F: FnOnce(Arc<[String]>) -> P,
{
    let reader = BufReader::with_capacity(READ_BUFFER_BYTES, BareAngleEscaper::new(reader));
    let mut extractor = TableExtractor::new(queue, row_pool, cancel, launch);
    let outcome = extractor.run(reader).await;
    extractor.queue.close();
    outcome?;
    extractor.finish()
}

struct TableExtractor<F, P> {
    queue: RowSender,
    row_pool: RowPool,
    cancel: CancellationToken,
    launch: Option<F>,
    launched: Option<(Arc<[String]>, P, LaunchTrigger)>,

    headers: Vec<String>,
    cells: Vec<String>,
    cell_text: String,
    cell_open: bool,
    row: Option<RowKind>,
    in_table: bool,
    in_thead: bool,
    in_tbody: bool,

    next_index: usize,
    rows_enqueued: usize,
    rows_dropped: usize,
    rows_before_launch: usize,
}

impl<F, P> TableExtractor<F, P>
where
    F: FnOnce(Arc<[String]>) -> P,
{
    fn new(queue: RowSender, row_pool: RowPool, cancel: CancellationToken, launch: F) -> Self {
        let cells = row_pool.take();
        Self {
            queue,
            row_pool,
            cancel,
            launch: Some(launch),
            launched: None,
            headers: Vec::new(),
            cells,
            cell_text: String::new(),
            cell_open: false,
            row: None,
            in_table: false,
            in_thead: false,
            in_tbody: false,
            next_index: 0,
            rows_enqueued: 0,
            rows_dropped: 0,
            rows_before_launch: 0,
        }
    }

    async fn run<R: AsyncBufRead + Unpin>(&mut self, reader: R) -> Result<(), ExtractError> {
        let mut reader = Reader::from_reader(reader);
        {
            let config = reader.config_mut();
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
            config.check_comments = false;
        }

        let mut buf = Vec::with_capacity(8 * 1024);
        loop {
            if self.cancel.is_cancelled() {
                return Err(ExtractError::Cancelled);
            }
            let token = match reader.read_event_into_async(&mut buf).await {
                Ok(event) => tokenize(event),
                Err(source) => {
                    return Err(ExtractError::Tokenize {
                        position: reader.buffer_position() as u64,
                        source,
                    });
                }
            };
            buf.clear();

            match token {
                Token::Start(tag) => self.on_start(tag).await?,
                Token::End(tag) => self.on_end(tag).await?,
                Token::Empty(tag) => {
                    self.on_start(tag).await?;
                    self.on_end(tag).await?;
                }
                Token::Text(text) => self.on_text(&text),
                Token::Eof => {
                    self.on_eof().await?;
                    return Ok(());
                }
                Token::Skip => {}
            }
        }
    }

    async fn on_start(&mut self, tag: Tag) -> Result<(), ExtractError> {
        match tag {
            Tag::Table => self.in_table = true,
            Tag::THead => {
                if self.in_table {
                    self.in_thead = true;
                }
            }
            Tag::TBody => {
                if self.in_table {
                    self.in_tbody = true;
                    self.launch_workers(LaunchTrigger::BodyStart);
                }
            }
            Tag::Tr => {
                // A new row implicitly closes one left open.
                if self.row.is_some() {
                    self.end_row().await?;
                }
                let is_header = self.in_thead
                    || (self.in_table
                        && !self.in_tbody
                        && self.launched.is_none()
                        && self.headers.is_empty());
                self.row = Some(if is_header {
                    RowKind::Header
                } else {
                    RowKind::Data
                });
                self.cells.clear();
            }
            Tag::Cell => {
                if self.row.is_some() {
                    if self.cell_open {
                        self.finish_cell();
                    }
                    self.cell_text.clear();
                    self.cell_open = true;
                }
            }
            Tag::Other => {}
        }
        Ok(())
    }

    async fn on_end(&mut self, tag: Tag) -> Result<(), ExtractError> {
        match tag {
            Tag::Cell => {
                if self.cell_open {
                    self.finish_cell();
                }
            }
            Tag::Tr => {
                if self.row.is_some() {
                    self.end_row().await?;
                }
            }
            Tag::THead => self.in_thead = false,
            Tag::TBody => self.in_tbody = false,
            Tag::Table => {
                if self.row.is_some() {
                    self.end_row().await?;
                }
                self.in_table = false;
                self.in_thead = false;
                self.in_tbody = false;
                self.launch_workers(LaunchTrigger::TableEnd);
            }
            Tag::Other => {}
        }
        Ok(())
    }

    fn on_text(&mut self, text: &str) {
        if self.cell_open {
            self.cell_text.push_str(text);
        }
    }

    async fn on_eof(&mut self) -> Result<(), ExtractError> {
        if self.row == Some(RowKind::Data) {
            if self.cell_open {
                self.finish_cell();
            }
            if !self.cells.is_empty() && self.launched.is_some() {
                self.push_row().await?;
            }
        }
        self.row = None;
        Ok(())
    }

    fn finish_cell(&mut self) {
        self.cell_open = false;
        let text = self.cell_text.trim();
        match self.row {
            Some(RowKind::Header) => {
                if !text.is_empty() {
                    self.headers.push(text.to_string());
                }
            }
            Some(RowKind::Data) => self.cells.push(text.to_string()),
            None => {}
        }
        self.cell_text.clear();
    }

    async fn end_row(&mut self) -> Result<(), ExtractError> {
        if self.cell_open {
            self.finish_cell();
        }
        match self.row.take() {
            Some(RowKind::Header) => {
                if self.in_table && !self.headers.is_empty() {
                    self.launch_workers(LaunchTrigger::HeaderRowEnd);
                }
            }
            Some(RowKind::Data) => {
                if self.cells.is_empty() {
                    return Ok(());
                }
                if self.launched.is_some() {
                    self.push_row().await?;
                } else {
                    self.rows_before_launch += 1;
                    debug!("discarding data row seen before headers were complete");
                    self.cells.clear();
                }
            }
            None => {}
        }
        Ok(())
    }

    async fn push_row(&mut self) -> Result<(), ExtractError> {
        let cells = std::mem::replace(&mut self.cells, self.row_pool.take());
        let row = RawRow {
            index: self.next_index,
            cells,
        };
        self.next_index += 1;
        match self.queue.send(row, &self.cancel).await {
            SendStatus::Queued => self.rows_enqueued += 1,
            SendStatus::Dropped => self.rows_dropped += 1,
            SendStatus::Closed => {
                if self.cancel.is_cancelled() {
                    return Err(ExtractError::Cancelled);
                }
                debug!("row queue closed by consumers");
            }
        }
        Ok(())
    }

    fn launch_workers(&mut self, trigger: LaunchTrigger) {
        if self.headers.is_empty() {
            return;
        }
        let Some(launch) = self.launch.take() else {
            return;
        };
        let snapshot: Arc<[String]> = Arc::from(self.headers.clone());
        self.row_pool = self.row_pool.with_headers(snapshot.len());
        info!(
            headers = snapshot.len(),
            trigger = trigger.label(),
            "launching workers"
        );
        let pool = launch(Arc::clone(&snapshot));
        self.launched = Some((snapshot, pool, trigger));
    }

    fn finish(self) -> Result<Extracted<P>, ExtractError> {
        let Some((headers, pool, trigger)) = self.launched else {
            if self.headers.is_empty() {
                return Err(ExtractError::NoHeaders);
            }
            return Err(ExtractError::WorkersNotStarted {
                header_count: self.headers.len(),
            });
        };
        Ok(Extracted {
            headers,
            pool,
            trigger,
            rows_enqueued: self.rows_enqueued,
            rows_dropped: self.rows_dropped,
            rows_before_launch: self.rows_before_launch,
        })
    }
}

/// Rewrites a `<` that cannot open markup as `&lt;`, so text such as
/// `A < B` reaches the tokenizer as text instead of a broken tag.
struct BareAngleEscaper<R> {
    inner: R,
    out: Vec<u8>,
    out_pos: usize,
    // A trailing `<` whose next byte has not been read yet.
    held_angle: bool,
    done: bool,
}

impl<R> BareAngleEscaper<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            out: Vec::with_capacity(ESCAPE_CHUNK_BYTES),
            out_pos: 0,
            held_angle: false,
            done: false,
        }
    }

    fn rewrite(&mut self, input: &[u8]) {
        for &byte in input {
            if self.held_angle {
                self.held_angle = false;
                if opens_markup(byte) {
                    self.out.push(b'<');
                } else {
                    self.out.extend_from_slice(b"&lt;");
                }
            }
            if byte == b'<' {
                self.held_angle = true;
            } else {
                self.out.push(byte);
            }
        }
    }
}

fn opens_markup(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || matches!(byte, b'/' | b'!' | b'?')
}

impl<R: AsyncRead + Unpin> AsyncRead for BareAngleEscaper<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if this.out_pos < this.out.len() {
                let n = buf.remaining().min(this.out.len() - this.out_pos);
                buf.put_slice(&this.out[this.out_pos..this.out_pos + n]);
                this.out_pos += n;
                if this.out_pos == this.out.len() {
                    this.out.clear();
                    this.out_pos = 0;
                }
                return Poll::Ready(Ok(()));
            }
            if this.done {
                return Poll::Ready(Ok(()));
            }

            let mut chunk = [0u8; ESCAPE_CHUNK_BYTES];
            let mut read = ReadBuf::new(&mut chunk);
            ready!(Pin::new(&mut this.inner).poll_read(cx, &mut read))?;
            if read.filled().is_empty() {
                this.done = true;
                if std::mem::take(&mut this.held_angle) {
                    this.out.extend_from_slice(b"&lt;");
                }
                continue;
            }
            this.rewrite(read.filled());
        }
    }
}

fn tokenize(event: Event<'_>) -> Token {
    match event {
        Event::Start(e) => Token::Start(Tag::from_name(e.local_name().as_ref())),
        Event::End(e) => Token::End(Tag::from_name(e.local_name().as_ref())),
        Event::Empty(e) => Token::Empty(Tag::from_name(e.local_name().as_ref())),
        Event::Text(e) => Token::Text(decode_text(&e)),
        Event::CData(e) => Token::Text(String::from_utf8_lossy(&e).into_owned()),
        Event::Eof => Token::Eof,
        _ => Token::Skip,
    }
}

// HTML entities (&nbsp;, &eacute;, numeric references) decoded; text with a
// stray '&' is kept verbatim.
fn decode_text(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    match unescape_with(&text, resolve_html5_entity) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => text.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::workers::{PipelineMetrics, row_queue};

    async fn collect(html: &str) -> (Result<Extracted<Arc<[String]>>, ExtractError>, Vec<RawRow>) {
        let metrics = Arc::new(PipelineMetrics::default());
        let (tx, rx) = row_queue(64, Duration::from_millis(50), metrics);
        let result = extract(
            html.as_bytes(),
            tx,
            RowPool::default(),
            CancellationToken::new(),
            |headers| headers,
        )
        .await;
        let mut rows = Vec::new();
        while let Some(row) = rx.recv().await {
            rows.push(row);
        }
        (result, rows)
    }

    #[tokio::test]
    async fn header_row_without_thead() {
        let html = "<table><tr><th>Name</th><th>Age</th></tr>\
                    <tr><td>Alice</td><td>25</td></tr></table>";
        let (result, rows) = collect(html).await;
        let extracted = result.unwrap();
        assert_eq!(extracted.headers.to_vec(), vec!["Name", "Age"]);
        assert_eq!(extracted.trigger, LaunchTrigger::HeaderRowEnd);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells, vec!["Alice", "25"]);
    }

    #[tokio::test]
    async fn thead_and_tbody_with_entities() {
        let html = "<TABLE><THEAD><TR><TH>Name</TH><TH> Club </TH></TR></THEAD>\
                    <TBODY><TR><TD>Jos&eacute;&nbsp;Sá</TD><TD><a href=\"#\">Real</a> Betis</TD></TR>\
                    <TR><TD></TD><TD>x</TD></TR></TBODY></TABLE>";
        let (result, rows) = collect(html).await;
        let extracted = result.unwrap();
        assert_eq!(extracted.headers.len(), 2);
        assert_eq!(extracted.rows_enqueued, 2);
        assert_eq!(rows[0].cells[0], "José\u{a0}Sá");
        assert_eq!(rows[0].cells[1], "Real Betis");
        assert_eq!(rows[1].cells, vec!["", "x"]);
        assert_eq!(rows[1].index, 1);
    }

    #[tokio::test]
    async fn later_header_rows_do_not_touch_the_snapshot() {
        let html = "<table><thead><tr><th>Name</th></tr><tr><th>Extra</th></tr></thead>\
                    <tbody><tr><td>Alice</td></tr></tbody></table>";
        let (result, _) = collect(html).await;
        let extracted = result.unwrap();
        assert_eq!(extracted.headers.to_vec(), vec!["Name"]);
    }

    #[tokio::test]
    async fn flushes_open_row_at_eof() {
        let html = "<table><tr><th>Name</th></tr><tr><td>Alice</td>";
        let (result, rows) = collect(html).await;
        assert!(result.is_ok());
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn no_table_is_no_headers() {
        let (result, rows) = collect("<html><body><p>nothing</p></body></html>").await;
        assert!(matches!(result, Err(ExtractError::NoHeaders)));
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn unterminated_header_is_workers_not_started() {
        let (result, _) = collect("<table><thead><tr><th>Name</th><th>Age</th>").await;
        assert!(matches!(
            result,
            Err(ExtractError::WorkersNotStarted { header_count: 2 })
        ));
    }

    #[tokio::test]
    async fn bare_angle_brackets_stay_in_cell_text() {
        let html = "<table><tr><th>Name</th><th>Note</th></tr>\
                    <tr><td>A < B</td><td>1<2 &amp; 3 &lt; 4</td></tr></table>";
        let (result, rows) = collect(html).await;
        assert!(result.is_ok());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells, vec!["A < B", "1<2 & 3 < 4"]);
    }

    #[tokio::test]
    async fn angle_split_across_reads() {
        use tokio::io::AsyncReadExt;

        let metrics = Arc::new(PipelineMetrics::default());
        let (tx, rx) = row_queue(4, Duration::from_millis(50), metrics);
        let reader = "<table><tr><th>Name</th></tr><tr><td>A <"
            .as_bytes()
            .chain(" B<".as_bytes())
            .chain("/td></tr></table> <".as_bytes());
        let result = extract(reader, tx, RowPool::default(), CancellationToken::new(), |h| h).await;
        assert!(result.is_ok());
        assert_eq!(rx.recv().await.map(|r| r.cells), Some(vec!["A < B".to_string()]));
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let metrics = Arc::new(PipelineMetrics::default());
        let (tx, rx) = row_queue(4, Duration::from_millis(50), metrics);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = extract(
            "<table><tr><th>Name</th></tr></table>".as_bytes(),
            tx,
            RowPool::default(),
            cancel,
            |headers| headers,
        )
        .await;
        assert!(matches!(result, Err(ExtractError::Cancelled)));
        assert!(rx.recv().await.is_none());
    }
}
