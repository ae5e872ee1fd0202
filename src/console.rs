//! Per-response encoder.
//!
//! A [`Console`] owns the payload for exactly one outgoing response and the
//! [`HeaderSink`] it writes into. Every successful call re-encodes the whole
//! payload and replaces the header, so the header is complete whenever the
//! host decides to flush.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    backtrace::BacktraceResolver,
    error::LogError,
    guard, metrics,
    payload::{Payload, Row, RowType, HEADER_NAME},
};

/// Arguments of one logging call
pub type Args = Vec<Value>;

/// Key used to tag structured arguments with their type name
pub const CLASS_NAME_KEY: &str = "___class_name";

/// The outgoing response as seen by the encoder
pub trait HeaderSink {
    /// True once the host has transmitted the response headers
    fn headers_sent(&self) -> bool;

    fn header(&self, name: &HeaderName) -> Option<&HeaderValue>;

    fn set_header(&mut self, name: HeaderName, value: HeaderValue);
}

impl<S: HeaderSink + ?Sized> HeaderSink for &mut S {
    fn headers_sent(&self) -> bool {
        (**self).headers_sent()
    }

    fn header(&self, name: &HeaderName) -> Option<&HeaderValue> {
        (**self).header(name)
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        (**self).set_header(name, value)
    }
}

/// A plain header map never reports its headers as sent
impl HeaderSink for HeaderMap {
    fn headers_sent(&self) -> bool {
        false
    }

    fn header(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.get(name)
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.insert(name, value);
    }
}

/// Accumulates rows for one response and mirrors them into its header
#[derive(Debug)]
pub struct Console<S> {
    sink: S,
    payload: Payload,
    resolver: BacktraceResolver,
}

impl<S: HeaderSink> Console<S> {
    pub fn new(sink: S) -> Self {
        Self::with_resolver(sink, BacktraceResolver::default())
    }

    pub fn with_resolver(sink: S, resolver: BacktraceResolver) -> Self {
        Self {
            sink,
            payload: Payload::new(),
            resolver,
        }
    }

    #[track_caller]
    pub fn log(&mut self, args: Args) -> Result<(), LogError> {
        self.record(RowType::Log, args)
    }

    #[track_caller]
    pub fn info(&mut self, args: Args) -> Result<(), LogError> {
        self.record(RowType::Info, args)
    }

    #[track_caller]
    pub fn warn(&mut self, args: Args) -> Result<(), LogError> {
        self.record(RowType::Warn, args)
    }

    #[track_caller]
    pub fn error(&mut self, args: Args) -> Result<(), LogError> {
        self.record(RowType::Error, args)
    }

    /// Open a block that the client renders expanded
    #[track_caller]
    pub fn group(&mut self, args: Args) -> Result<(), LogError> {
        self.record(RowType::Group, args)
    }

    /// Open a block that the client renders collapsed
    #[track_caller]
    pub fn group_collapsed(&mut self, args: Args) -> Result<(), LogError> {
        self.record(RowType::GroupCollapsed, args)
    }

    /// Close the innermost open group
    pub fn group_end(&mut self) -> Result<(), LogError> {
        self.ensure_open(RowType::GroupEnd)?;
        self.commit(Row::group_end())
    }

    /// Committed rows, in call order
    pub fn rows(&self) -> &[Row] {
        &self.payload.rows
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    #[track_caller]
    fn record(&mut self, kind: RowType, args: Args) -> Result<(), LogError> {
        self.ensure_open(kind)?;
        let backtrace = self.resolver.resolve();
        self.commit(Row::new(kind, args, backtrace))
    }

    fn ensure_open(&self, kind: RowType) -> Result<(), LogError> {
        guard::ensure_not_sent(self.sink.headers_sent()).inspect_err(|err| {
            warn!(row_type = kind.label(), "Rejected log row: {}", err);
            metrics::record_rejection(err.reason());
        })
    }

    /// Append `row`, re-encode, and publish the header; on any failure the
    /// row is dropped and the committed state is left untouched.
    fn commit(&mut self, row: Row) -> Result<(), LogError> {
        let kind = row.kind;
        self.payload.rows.push(row);

        let value = match self.encode_candidate() {
            Ok(value) => value,
            Err(err) => {
                self.payload.rows.pop();
                warn!(row_type = kind.label(), "Rejected log row: {}", err);
                metrics::record_rejection(err.reason());
                return Err(err);
            }
        };

        debug!(
            row_type = kind.label(),
            rows = self.payload.rows.len(),
            header_bytes = value.len(),
            "Committed log row"
        );
        self.sink
            .set_header(HeaderName::from_static(HEADER_NAME), value);
        metrics::record_row(kind.label());
        Ok(())
    }

    fn encode_candidate(&self) -> Result<HeaderValue, LogError> {
        let encoded = self.payload.encode()?;
        guard::ensure_within_limit(&encoded)?;
        Ok(HeaderValue::try_from(encoded)?)
    }
}

/// Convert one log argument to JSON.
///
/// Structured values that are not already JSON maps or std collections get a
/// `___class_name` entry with their short type name.
pub fn to_arg<T: Serialize + ?Sized>(value: &T) -> Result<Value, LogError> {
    let mut value = serde_json::to_value(value)?;
    if let Value::Object(map) = &mut value {
        if let Some(class) = class_name::<T>() {
            map.entry(CLASS_NAME_KEY)
                .or_insert_with(|| Value::String(class));
        }
    }
    Ok(value)
}

fn class_name<T: ?Sized>() -> Option<String> {
    const UNTAGGED: [&str; 6] = [
        "serde_json::",
        "std::",
        "alloc::",
        "core::",
        "hashbrown::",
        "indexmap::",
    ];

    let full = unwrap_transparent(std::any::type_name::<T>());
    if UNTAGGED.iter().any(|prefix| full.starts_with(prefix)) {
        return None;
    }

    let base = full.split('<').next().unwrap_or(full);
    let short = base.rsplit("::").next().unwrap_or(base);
    if short.is_empty() {
        None
    } else {
        Some(short.to_string())
    }
}

/// Strip references and smart-pointer or `Option` wrappers, which serialize
/// as their contents
fn unwrap_transparent(mut name: &str) -> &str {
    const TRANSPARENT: [&str; 5] = [
        "alloc::boxed::Box<",
        "core::option::Option<",
        "alloc::rc::Rc<",
        "alloc::sync::Arc<",
        "alloc::borrow::Cow<",
    ];

    loop {
        name = name.trim_start_matches(|c: char| c == '&' || c == '*');
        name = name
            .strip_prefix("mut ")
            .or_else(|| name.strip_prefix("const "))
            .unwrap_or(name);

        match TRANSPARENT.iter().find_map(|prefix| name.strip_prefix(prefix)) {
            Some(args) => name = first_generic_arg(args),
            None => return name,
        }
    }
}

/// First argument of a generic list, given the text after its opening `<`
fn first_generic_arg(args: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in args.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' if depth > 0 => depth -= 1,
            ',' | '>' if depth == 0 => return args[..i].trim(),
            _ => {}
        }
    }
    args.trim()
}

/// Build the argument list of a logging call from any `Serialize` values.
///
/// Evaluates to `Result<Args, LogError>`.
#[macro_export]
macro_rules! console_args {
    ($($arg:expr),* $(,)?) => {{
        let args: ::std::vec::Vec<::std::result::Result<$crate::serde_json::Value, $crate::LogError>> =
            ::std::vec![$($crate::console::to_arg(&$arg)),*];
        args.into_iter()
            .collect::<::std::result::Result<::std::vec::Vec<_>, _>>()
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __console_call {
    ($method:ident, $console:expr $(, $arg:expr)*) => {
        match $crate::console_args!($($arg),*) {
            ::std::result::Result::Ok(args) => $console.$method(args),
            ::std::result::Result::Err(err) => ::std::result::Result::Err(err),
        }
    };
}

/// `chrome_log!(console, "user", user_id, &user)`
#[macro_export]
macro_rules! chrome_log {
    ($console:expr $(, $arg:expr)* $(,)?) => {
        $crate::__console_call!(log, $console $(, $arg)*)
    };
}

#[macro_export]
macro_rules! chrome_info {
    ($console:expr $(, $arg:expr)* $(,)?) => {
        $crate::__console_call!(info, $console $(, $arg)*)
    };
}

#[macro_export]
macro_rules! chrome_warn {
    ($console:expr $(, $arg:expr)* $(,)?) => {
        $crate::__console_call!(warn, $console $(, $arg)*)
    };
}

#[macro_export]
macro_rules! chrome_error {
    ($console:expr $(, $arg:expr)* $(,)?) => {
        $crate::__console_call!(error, $console $(, $arg)*)
    };
}

#[macro_export]
macro_rules! chrome_group {
    ($console:expr $(, $arg:expr)* $(,)?) => {
        $crate::__console_call!(group, $console $(, $arg)*)
    };
}

#[macro_export]
macro_rules! chrome_group_collapsed {
    ($console:expr $(, $arg:expr)* $(,)?) => {
        $crate::__console_call!(group_collapsed, $console $(, $arg)*)
    };
}
