//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The file channel.

use crate::comm::dedicated::{DedicatedFormat, NetpbmFormat, SamFormat, SequenceFormat, SequenceKind};
use crate::comm::{Address, CommError, Direction, FileCommConfig, FileFormat, EOF_SENTINEL};
use crate::datatypes::{TypeRegistry, Value};
use crate::error::YggError;
use crate::observability::{log_error, CommMetrics, ErrorMetrics};
use crate::serialization::framing::complete_frame_len;
use crate::serialization::{
    AsciiTableSerializer, Codec, CodecError, DefaultSerializer, DirectSerializer, FormatSerializer, ObjSerializer,
    PandasSerializer, PickleSerializer, PlySerializer, ReadMode,
};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

enum Backend {
    Serialized(Box<dyn FormatSerializer>),
    Dedicated(Box<dyn DedicatedFormat>),
}

impl Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::Serialized(serializer) => serializer.name(),
            Backend::Dedicated(format) => format.name(),
        }
    }
}

/// The file currently backing an open channel.
struct Member {
    path: PathBuf,
    /// `None` for dedicated formats, which own their handle
    file: Option<File>,
    /// Read offset
    position: u64,
    /// The whole-file unit was handed out
    delivered: bool,
    /// Past the last series member
    exhausted: bool,
}

impl Member {
    fn new(path: PathBuf, file: Option<File>) -> Self {
        Self {
            path,
            file,
            position: 0,
            delivered: false,
            exhausted: false,
        }
    }

    fn exhausted(path: PathBuf) -> Self {
        Self {
            exhausted: true,
            ..Self::new(path, None)
        }
    }
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> CommError + '_ {
    move |source| CommError::io(path, source)
}

/// A channel that reads messages from, or writes them to, a file or a
/// numbered series of files.
///
/// # Examples
///
/// ```rust
/// use yggcomm::comm::{Direction, FileComm, FileCommConfig, FileFormat};
/// use yggcomm::datatypes::Value;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("out.txt");
/// let path = path.to_str().unwrap();
///
/// let mut output = FileComm::new("output", path, Direction::Send, FileCommConfig::default()).unwrap();
/// assert!(output.open());
/// assert!(output.send_value(&Value::from(42i64)).unwrap());
/// output.close();
///
/// let mut input = FileComm::new("input", path, Direction::Recv, FileCommConfig::default()).unwrap();
/// assert!(input.open());
/// assert_eq!(input.recv_value().unwrap(), Some(Value::from(42i64)));
/// let (flag, message) = input.recv().unwrap();
/// assert!(!flag);
/// assert!(yggcomm::comm::is_eof(&message));
/// ```
pub struct FileComm {
    name: String,
    address: Address,
    direction: Direction,
    config: FileCommConfig,
    backend: Backend,
    codec: Codec,
    index: u64,
    member: Option<Member>,
    metrics: Arc<CommMetrics>,
    errors: Arc<ErrorMetrics>,
}

impl FileComm {
    /// Creates a closed channel for the format named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Address`] for an unusable address and
    /// [`CommError::Codec`] for a bad datatype or table format string.
    pub fn new(
        name: impl Into<String>,
        address: &str,
        direction: Direction,
        config: FileCommConfig,
    ) -> Result<Self, CommError> {
        let codec = match &config.datatype {
            Some(definition) => Codec::bound(TypeRegistry::global(), definition.clone())?,
            None => Codec::new(TypeRegistry::global()),
        };
        let backend = match config.format {
            FileFormat::Default => Backend::Serialized(Box::new(DefaultSerializer::new(codec.clone()))),
            FileFormat::Direct => Backend::Serialized(Box::new(DirectSerializer)),
            FileFormat::Table => {
                let mut table = AsciiTableSerializer::new()
                    .with_comment(config.comment.clone())
                    .with_delimiter(config.delimiter.clone())
                    .with_newline(config.newline.clone())
                    .with_column_names(config.column_names.clone())
                    .with_as_array(config.as_array);
                if let Some(format_str) = &config.format_str {
                    table = table.with_format_str(format_str)?;
                }
                Backend::Serialized(Box::new(table))
            }
            FileFormat::Ply => Backend::Serialized(Box::new(PlySerializer)),
            FileFormat::Obj => Backend::Serialized(Box::new(ObjSerializer)),
            FileFormat::Pandas => {
                Backend::Serialized(Box::new(PandasSerializer::default().with_delimiter(config.delimiter.clone())))
            }
            FileFormat::Pickle => Backend::Serialized(Box::new(PickleSerializer::new(codec.clone()))),
            FileFormat::Fasta => Backend::Dedicated(Box::new(SequenceFormat::new(SequenceKind::Fasta))),
            FileFormat::Fastq => Backend::Dedicated(Box::new(SequenceFormat::new(SequenceKind::Fastq))),
            FileFormat::Sam => Backend::Dedicated(Box::new(SamFormat::new())),
            FileFormat::Netpbm => Backend::Dedicated(Box::new(NetpbmFormat::new())),
        };
        Self::build(name.into(), address, direction, config, backend, codec)
    }

    /// Creates a closed channel around a custom serializer.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Address`] for an unusable address.
    pub fn with_serializer(
        name: impl Into<String>,
        address: &str,
        direction: Direction,
        config: FileCommConfig,
        serializer: Box<dyn FormatSerializer>,
    ) -> Result<Self, CommError> {
        let codec = Codec::new(TypeRegistry::global());
        Self::build(name.into(), address, direction, config, Backend::Serialized(serializer), codec)
    }

    /// Creates a closed channel around a custom dedicated adapter.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Address`] for an unusable address.
    pub fn with_dedicated(
        name: impl Into<String>,
        address: &str,
        direction: Direction,
        config: FileCommConfig,
        format: Box<dyn DedicatedFormat>,
    ) -> Result<Self, CommError> {
        let codec = Codec::new(TypeRegistry::global());
        Self::build(name.into(), address, direction, config, Backend::Dedicated(format), codec)
    }

    fn build(
        name: String,
        address: &str,
        direction: Direction,
        config: FileCommConfig,
        backend: Backend,
        codec: Codec,
    ) -> Result<Self, CommError> {
        let address = Address::resolve(address, config.is_series)?;
        Ok(Self {
            name,
            address,
            direction,
            index: config.series_start,
            config,
            backend,
            codec,
            member: None,
            metrics: Arc::new(CommMetrics::new()),
            errors: Arc::new(ErrorMetrics::new()),
        })
    }

    /// Returns the channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the channel address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Returns the direction messages flow.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the channel configuration.
    pub fn config(&self) -> &FileCommConfig {
        &self.config
    }

    /// Returns the name of the on-disk format.
    pub fn format_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Returns the serializer, unless a dedicated adapter owns the file.
    pub fn serializer(&self) -> Option<&dyn FormatSerializer> {
        match &self.backend {
            Backend::Serialized(serializer) => Some(serializer.as_ref()),
            Backend::Dedicated(_) => None,
        }
    }

    /// Returns the channel counters.
    pub fn metrics(&self) -> &Arc<CommMetrics> {
        &self.metrics
    }

    /// Returns the counts of errors the channel reported and swallowed.
    pub fn error_metrics(&self) -> &Arc<ErrorMetrics> {
        &self.errors
    }

    /// Returns the index of the current series member.
    pub fn series_index(&self) -> u64 {
        self.index
    }

    /// Returns the path of the file currently open.
    pub fn current_path(&self) -> Option<&Path> {
        self.member.as_ref().map(|member| member.path.as_path())
    }

    /// Returns `true` while the channel is open.
    pub fn is_open(&self) -> bool {
        self.member.is_some()
    }

    /// Returns `true` once an open series has run past its last member.
    pub fn is_exhausted(&self) -> bool {
        self.member.as_ref().is_some_and(|member| member.exhausted)
    }

    fn read_mode(&self) -> ReadMode {
        match &self.backend {
            Backend::Serialized(serializer) => self.config.read_mode.unwrap_or_else(|| serializer.read_mode()),
            Backend::Dedicated(_) => ReadMode::All,
        }
    }

    /// Opens the channel, logging and returning `false` on failure.
    ///
    /// Opening an open channel does nothing.
    pub fn open(&mut self) -> bool {
        match self.try_open() {
            Ok(()) => true,
            Err(error) => {
                self.report(error);
                false
            }
        }
    }

    /// Opens the channel.
    ///
    /// A receiving series whose first member does not exist yet opens at
    /// end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Address`] when a receiving channel's file does
    /// not exist, [`CommError::Io`] when it cannot be opened and
    /// [`CommError::Codec`] when its preamble is unusable.
    pub fn try_open(&mut self) -> Result<(), CommError> {
        if self.member.is_some() {
            return Ok(());
        }
        self.index = self.config.series_start;
        let member = self.open_member()?;
        info!(
            comm = %self.name,
            address = %self.address,
            direction = %self.direction,
            format = self.backend.name(),
            "Opened file comm"
        );
        self.member = Some(member);
        Ok(())
    }

    fn open_member(&mut self) -> Result<Member, CommError> {
        let path = self.address.path(self.index);
        let past_end = self.config.series_end.is_some_and(|end| self.index > end);
        if self.address.is_series() && past_end {
            return Ok(Member::exhausted(path));
        }
        match self.direction {
            Direction::Recv => {
                if !path.is_file() {
                    if self.address.is_series() {
                        debug!(comm = %self.name, path = %path.display(), "Series member missing, end of stream");
                        return Ok(Member::exhausted(path));
                    }
                    return Err(CommError::address(path, "file does not exist"));
                }
                let file = match &mut self.backend {
                    Backend::Serialized(serializer) => {
                        let mut file = File::open(&path).map_err(io_error(&path))?;
                        let mut contents = Vec::new();
                        file.read_to_end(&mut contents).map_err(io_error(&path))?;
                        serializer.prepare_read(&contents)?;
                        Some(file)
                    }
                    Backend::Dedicated(format) => {
                        format.open(&path, Direction::Recv)?;
                        None
                    }
                };
                Ok(Member::new(path, file))
            }
            Direction::Send => {
                let truncate = !self.config.append;
                let file = match &mut self.backend {
                    Backend::Serialized(_) => Some(
                        OpenOptions::new()
                            .read(true)
                            .write(true)
                            .create(true)
                            .truncate(truncate)
                            .open(&path)
                            .map_err(io_error(&path))?,
                    ),
                    Backend::Dedicated(format) => {
                        if truncate {
                            File::create(&path).map_err(io_error(&path))?;
                        }
                        format.open(&path, Direction::Send)?;
                        None
                    }
                };
                Ok(Member::new(path, file))
            }
        }
    }

    /// Closes the channel, flushing pending writes. Closing a closed
    /// channel does nothing.
    pub fn close(&mut self) {
        let Some(member) = self.member.take() else {
            return;
        };
        if let Err(error) = self.release(member) {
            warn!(comm = %self.name, %error, "Error while closing file comm");
        }
        debug!(comm = %self.name, "Closed file comm");
    }

    fn release(&mut self, member: Member) -> Result<(), CommError> {
        if let Some(mut file) = member.file {
            if self.direction == Direction::Send {
                file.flush().map_err(io_error(&member.path))?;
            }
        }
        if let Backend::Dedicated(format) = &mut self.backend {
            format.close()?;
        }
        Ok(())
    }

    /// Counts and logs an error the boolean API swallows.
    fn report(&self, error: CommError) {
        let error = YggError::from(error);
        self.errors.record_error(&error);
        let _span = info_span!("file_comm", comm = %self.name, address = %self.address).entered();
        log_error(&error);
    }

    fn check(&self, direction: Direction, operation: &'static str) -> Result<(), CommError> {
        if self.member.is_none() {
            return Err(CommError::Closed {
                comm: self.name.clone(),
            });
        }
        if self.direction != direction {
            return Err(CommError::WrongDirection {
                comm: self.name.clone(),
                operation,
                direction: self.direction.as_str(),
            });
        }
        Ok(())
    }

    /// Writes one message, logging and returning `false` on failure.
    pub fn send(&mut self, message: &[u8]) -> bool {
        match self.try_send(message) {
            Ok(()) => true,
            Err(error) => {
                self.metrics.record_send_failure();
                self.report(error);
                false
            }
        }
    }

    /// Writes one message.
    ///
    /// Formats that merge on append rewrite a non-empty file as the merge
    /// of its current content and the message. Other formats append the
    /// message, preceded by the format's file header when the file is
    /// empty and followed by a newline in line mode. Dedicated formats
    /// receive the value the message encodes.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Closed`] or [`CommError::WrongDirection`] on
    /// misuse, [`CommError::Io`] when writing fails and
    /// [`CommError::Codec`] when a merge cannot decode its inputs.
    pub fn try_send(&mut self, message: &[u8]) -> Result<(), CommError> {
        self.check(Direction::Send, "send")?;
        let line_mode = self.read_mode() == ReadMode::Line;
        let Some(member) = self.member.as_mut() else {
            return Err(CommError::Closed {
                comm: self.name.clone(),
            });
        };
        if member.exhausted {
            return Err(CommError::address(&member.path, "past the last member of the series"));
        }
        let written = match &mut self.backend {
            Backend::Serialized(serializer) => write_serialized(
                serializer.as_mut(),
                member,
                message,
                line_mode.then_some(self.config.newline.as_str()),
                &self.metrics,
            )?,
            Backend::Dedicated(format) => {
                let value = self.codec.decode_value(message)?;
                format.write_unit(&value)?;
                message.len()
            }
        };
        self.metrics.record_sent(written as u64);
        Ok(())
    }

    /// Serializes and writes one value.
    ///
    /// Returns `Ok(false)` when the write fails, as [`send`](Self::send)
    /// does.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is misused or the value cannot be
    /// represented in this format.
    pub fn send_value(&mut self, value: &Value) -> Result<bool, CommError> {
        self.check(Direction::Send, "send")?;
        match &mut self.backend {
            Backend::Serialized(serializer) => {
                let message = serializer.serialize(value)?;
                Ok(self.send(&message))
            }
            Backend::Dedicated(format) => match format.write_unit(value) {
                Ok(()) => {
                    self.metrics.record_sent(0);
                    Ok(true)
                }
                Err(CommError::Codec(error)) => Err(CommError::Codec(error)),
                Err(error) => {
                    self.metrics.record_send_failure();
                    self.report(error);
                    Ok(false)
                }
            },
        }
    }

    /// Reads the next message.
    ///
    /// Returns `(false, EOF_SENTINEL)` once no data is left. In whole-file
    /// mode that is after the remaining content was returned once; in line
    /// mode after the last non-comment line; in framed mode after the last
    /// complete frame. Series channels move on to the next member before
    /// reporting end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is misused, a read fails, or the file
    /// holds a truncated frame or an unparsable dedicated unit.
    pub fn recv(&mut self) -> Result<(bool, Vec<u8>), CommError> {
        match self.receive(Self::next_message)? {
            Some(message) => Ok((true, message)),
            None => Ok((false, EOF_SENTINEL.to_vec())),
        }
    }

    /// Polls [`recv`](Self::recv) until a message arrives or `timeout`
    /// elapses.
    ///
    /// # Errors
    ///
    /// Returns the first error [`recv`](Self::recv) reports.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<(bool, Vec<u8>), CommError> {
        let deadline = Instant::now() + timeout;
        loop {
            let (flag, message) = self.recv()?;
            let now = Instant::now();
            if flag || self.is_exhausted() || now >= deadline {
                return Ok((flag, message));
            }
            std::thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    /// Reads and decodes the next message, or returns `None` at end of
    /// stream.
    ///
    /// # Errors
    ///
    /// Returns an error as [`recv`](Self::recv) does, or when the message
    /// does not decode.
    pub fn recv_value(&mut self) -> Result<Option<Value>, CommError> {
        self.receive(Self::next_value)
    }

    fn receive<T>(
        &mut self,
        mut pull: impl FnMut(&mut Self) -> Result<Option<T>, CommError>,
    ) -> Result<Option<T>, CommError> {
        self.check(Direction::Recv, "receive")?;
        loop {
            if self.is_exhausted() {
                return Ok(None);
            }
            if let Some(unit) = pull(self)? {
                return Ok(Some(unit));
            }
            if !self.advance_in_series()? {
                return Ok(None);
            }
        }
    }

    fn next_message(&mut self) -> Result<Option<Vec<u8>>, CommError> {
        let read_mode = self.read_mode();
        let Some(member) = self.member.as_mut() else {
            return Ok(None);
        };
        let message = match &mut self.backend {
            Backend::Serialized(serializer) => read_serialized(serializer.as_ref(), member, read_mode)?,
            Backend::Dedicated(format) => match next_unit(format.as_mut(), member, &self.metrics)? {
                Some(value) => Some(self.codec.serialize(&value)?),
                None => None,
            },
        };
        if let Some(message) = &message {
            self.metrics.record_received(message.len() as u64);
        }
        Ok(message)
    }

    fn next_value(&mut self) -> Result<Option<Value>, CommError> {
        if let Backend::Dedicated(format) = &mut self.backend {
            let Some(member) = self.member.as_ref() else {
                return Ok(None);
            };
            let value = next_unit(format.as_mut(), member, &self.metrics)?;
            if value.is_some() {
                self.metrics.record_received(0);
            }
            return Ok(value);
        }
        let Some(message) = self.next_message()? else {
            return Ok(None);
        };
        match &mut self.backend {
            Backend::Serialized(serializer) => Ok(Some(serializer.deserialize(&message)?)),
            Backend::Dedicated(_) => Ok(None),
        }
    }

    /// Returns the number of unread bytes in the current file, or 0 when
    /// closed, exhausted or sending.
    pub fn remaining_bytes(&self) -> u64 {
        let Some(member) = &self.member else {
            return 0;
        };
        if member.exhausted || self.direction == Direction::Send {
            return 0;
        }
        match &self.backend {
            Backend::Dedicated(format) => format.remaining_bytes(),
            Backend::Serialized(_) => member
                .file
                .as_ref()
                .and_then(|file| file.metadata().ok())
                .map_or(0, |metadata| metadata.len().saturating_sub(member.position)),
        }
    }

    /// Moves a series channel to its next member.
    ///
    /// Returns `false` for plain files and once the series is exhausted,
    /// either past `series_end` or, when receiving, at the first missing
    /// member. Dedicated adapters forget which units they handed out.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Closed`] on a closed channel, or the error that
    /// prevented opening the next member, which leaves the channel closed.
    pub fn advance_in_series(&mut self) -> Result<bool, CommError> {
        if !self.address.is_series() {
            return Ok(false);
        }
        let Some(member) = self.member.take() else {
            return Err(CommError::Closed {
                comm: self.name.clone(),
            });
        };
        if member.exhausted {
            self.member = Some(member);
            return Ok(false);
        }
        self.release(member)?;
        if let Backend::Dedicated(format) = &mut self.backend {
            format.reset_processed();
        }
        self.index += 1;
        self.metrics.record_series_advance();

        let member = self.open_member()?;
        let advanced = !member.exhausted;
        if advanced {
            debug!(comm = %self.name, path = %member.path.display(), index = self.index, "Advanced in series");
        } else {
            debug!(comm = %self.name, index = self.index, "Series exhausted");
        }
        self.member = Some(member);
        Ok(advanced)
    }
}

fn write_serialized(
    serializer: &mut dyn FormatSerializer,
    member: &mut Member,
    message: &[u8],
    line_newline: Option<&str>,
    metrics: &CommMetrics,
) -> Result<usize, CommError> {
    let path = member.path.as_path();
    let Some(file) = member.file.as_mut() else {
        return Err(CommError::address(path, "file is not open"));
    };
    let len = file.metadata().map_err(io_error(path))?.len();

    let mut out = Vec::new();
    if serializer.merges_on_append() && len > 0 {
        let mut existing = Vec::new();
        file.seek(SeekFrom::Start(0)).map_err(io_error(path))?;
        file.read_to_end(&mut existing).map_err(io_error(path))?;
        let existing = serializer.deserialize(&existing)?;
        let incoming = serializer.deserialize(message)?;
        let merged = serializer.merge(&[existing, incoming])?;
        if let Some(header) = serializer.file_header() {
            out.extend(header);
        }
        out.extend(serializer.serialize(&merged)?);
        file.set_len(0).map_err(io_error(path))?;
        file.seek(SeekFrom::Start(0)).map_err(io_error(path))?;
        file.write_all(&out).map_err(io_error(path))?;
        metrics.record_merge();
        debug!(path = %path.display(), format = serializer.name(), bytes = out.len(), "Merged message into file");
    } else {
        if len == 0 {
            if let Some(header) = serializer.file_header() {
                out.extend(header);
            }
        }
        out.extend_from_slice(message);
        if let Some(newline) = line_newline {
            if !message.is_empty() && !message.ends_with(b"\n") {
                out.extend_from_slice(newline.as_bytes());
            }
        }
        file.seek(SeekFrom::End(0)).map_err(io_error(path))?;
        file.write_all(&out).map_err(io_error(path))?;
    }
    file.flush().map_err(io_error(path))?;
    Ok(out.len())
}

fn read_serialized(
    serializer: &dyn FormatSerializer,
    member: &mut Member,
    read_mode: ReadMode,
) -> Result<Option<Vec<u8>>, CommError> {
    let path = member.path.as_path();
    let Some(file) = member.file.as_mut() else {
        return Ok(None);
    };
    if read_mode == ReadMode::All && member.delivered {
        return Ok(None);
    }
    let mut rest = Vec::new();
    file.seek(SeekFrom::Start(member.position)).map_err(io_error(path))?;
    file.read_to_end(&mut rest).map_err(io_error(path))?;

    let (consumed, message) = match read_mode {
        ReadMode::All => {
            let len = rest.len();
            member.delivered = len > 0;
            (len, member.delivered.then_some(rest))
        }
        ReadMode::Line => {
            let mut consumed = 0;
            let mut message = None;
            for line in rest.split_inclusive(|&byte| byte == b'\n') {
                consumed += line.len();
                if !serializer.is_comment(line) {
                    message = Some(line.to_vec());
                    break;
                }
            }
            (consumed, message)
        }
        ReadMode::Framed => {
            if rest.is_empty() {
                (0, None)
            } else {
                let Some(len) = complete_frame_len(&rest) else {
                    return Err(CodecError::format(
                        "framed record",
                        member.position as usize,
                        "incomplete or oversized frame",
                    )
                    .into());
                };
                (len, Some(rest[..len].to_vec()))
            }
        }
    };
    member.position += consumed as u64;
    Ok(message)
}

fn next_unit(
    format: &mut dyn DedicatedFormat,
    member: &Member,
    metrics: &CommMetrics,
) -> Result<Option<Value>, CommError> {
    if format.requires_refresh() {
        format.close()?;
        format.open(&member.path, Direction::Recv)?;
        metrics.record_refresh();
        debug!(path = %member.path.display(), format = format.name(), "Reopened dedicated file");
    }
    format.read_unit()
}

impl Drop for FileComm {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for FileComm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileComm")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("direction", &self.direction)
            .field("format", &self.backend.name())
            .field("index", &self.index)
            .field("open", &self.is_open())
            .finish()
    }
}
