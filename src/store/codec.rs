//! Record codec (envelope + field framing).
//!
//! Every persisted value is a tagged envelope: magic, format version, a
//! contents tag selecting the record kind, the payload length, and a crc32c
//! over the payload. Payloads are sequences of `(field id, length, bytes)`
//! triples; readers skip unknown field ids and default missing ones, so
//! fields can be added without breaking old data. Every length is checked
//! before the bytes behind it are touched.

use crc32c::crc32c;
use thiserror::Error;

use crate::caps::{Clock, IdGenerator};
use crate::cube::{Move, MoveSequence, TimedMove, TimedMoveSequence};
use crate::history::{Session, SessionId, Solve, SolveId, SolveType, SyncStamp};
use crate::phase::SplitTimes;

const MAGIC: u32 = u32::from_le_bytes(*b"CLG1");
const VERSION: u16 = 1;
const ENVELOPE_HEADER_LEN: usize = 16;

/// Kind of persisted record, used as the envelope's contents tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Solve,
    SolveList,
    Session,
    SessionList,
}

impl RecordKind {
    fn tag(self) -> u8 {
        match self {
            RecordKind::Solve => 1,
            RecordKind::SolveList => 2,
            RecordKind::Session => 3,
            RecordKind::SessionList => 4,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(RecordKind::Solve),
            2 => Some(RecordKind::SolveList),
            3 => Some(RecordKind::Session),
            4 => Some(RecordKind::SessionList),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Solve => "solve",
            RecordKind::SolveList => "solve list",
            RecordKind::Session => "session",
            RecordKind::SessionList => "session list",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codec verification failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} record is corrupt: {reason}")]
pub struct CodecError {
    pub kind: RecordKind,
    pub reason: String,
}

impl CodecError {
    fn new(kind: RecordKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

type CodecResult<T> = Result<T, CodecError>;

// Solve payload fields.
const SOLVE_SCRAMBLE: u8 = 1;
const SOLVE_CREATED: u8 = 2;
const SOLVE_OK: u8 = 3;
const SOLVE_TIME: u8 = 4;
const SOLVE_PENALTY: u8 = 5;
const SOLVE_DEVICE: u8 = 6;
const SOLVE_MOVES: u8 = 7;
const SOLVE_SPLITS: u8 = 8;
const SOLVE_UPDATE: u8 = 9;

// Session payload fields.
const SESSION_TYPE: u8 = 1;
const SESSION_NAME: u8 = 2;
const SESSION_UPDATE: u8 = 3;

// List payloads: one entry field per id, in order.
const LIST_ENTRY: u8 = 1;

fn encode_envelope(kind: RecordKind, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ENVELOPE_HEADER_LEN + payload.len());
    buf.extend_from_slice(&MAGIC.to_le_bytes());
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.push(kind.tag());
    buf.push(0);
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(&crc32c(payload).to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

fn decode_envelope(kind: RecordKind, data: &[u8]) -> CodecResult<&[u8]> {
    if data.len() < ENVELOPE_HEADER_LEN {
        return Err(CodecError::new(kind, "envelope truncated"));
    }
    let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if magic != MAGIC {
        return Err(CodecError::new(kind, format!("bad magic {magic:#010x}")));
    }
    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != VERSION {
        return Err(CodecError::new(
            kind,
            format!("unsupported format version {version}"),
        ));
    }
    let tag = data[6];
    if data[7] != 0 {
        return Err(CodecError::new(kind, "reserved byte not zero"));
    }
    let found = RecordKind::from_tag(tag)
        .ok_or_else(|| CodecError::new(kind, format!("unknown contents tag {tag}")))?;
    if found != kind {
        return Err(CodecError::new(
            kind,
            format!("contains a {found} record"),
        ));
    }
    let len = u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize;
    let payload = &data[ENVELOPE_HEADER_LEN..];
    if len != payload.len() {
        return Err(CodecError::new(
            kind,
            format!("payload length {len} does not match buffer ({})", payload.len()),
        ));
    }
    let expected_crc = u32::from_le_bytes([data[12], data[13], data[14], data[15]]);
    let actual_crc = crc32c(payload);
    if actual_crc != expected_crc {
        return Err(CodecError::new(
            kind,
            format!("crc mismatch (expected {expected_crc:#010x}, got {actual_crc:#010x})"),
        ));
    }
    Ok(payload)
}

struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn field(&mut self, id: u8, body: &[u8]) {
        self.buf.push(id);
        self.buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(body);
    }

    fn u8_field(&mut self, id: u8, value: u8) {
        self.field(id, &[value]);
    }

    fn u32_field(&mut self, id: u8, value: u32) {
        self.field(id, &value.to_le_bytes());
    }

    fn u64_field(&mut self, id: u8, value: u64) {
        self.field(id, &value.to_le_bytes());
    }

    fn str_field(&mut self, id: u8, value: &str) {
        self.field(id, value.as_bytes());
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

struct FieldReader<'a> {
    kind: RecordKind,
    data: &'a [u8],
    offset: usize,
}

impl<'a> FieldReader<'a> {
    fn new(kind: RecordKind, data: &'a [u8]) -> Self {
        Self {
            kind,
            data,
            offset: 0,
        }
    }

    fn next(&mut self) -> CodecResult<Option<(u8, &'a [u8])>> {
        if self.offset == self.data.len() {
            return Ok(None);
        }
        if self.data.len() - self.offset < 5 {
            return Err(CodecError::new(self.kind, "field header truncated"));
        }
        let id = self.data[self.offset];
        let len = u32::from_le_bytes([
            self.data[self.offset + 1],
            self.data[self.offset + 2],
            self.data[self.offset + 3],
            self.data[self.offset + 4],
        ]) as usize;
        let start = self.offset + 5;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                CodecError::new(self.kind, format!("field {id} overruns the payload"))
            })?;
        self.offset = end;
        Ok(Some((id, &self.data[start..end])))
    }
}

fn decode_u8(kind: RecordKind, body: &[u8]) -> CodecResult<u8> {
    match body {
        [value] => Ok(*value),
        _ => Err(CodecError::new(kind, "scalar field has wrong length")),
    }
}

fn decode_u32(kind: RecordKind, body: &[u8]) -> CodecResult<u32> {
    let bytes: [u8; 4] = body
        .try_into()
        .map_err(|_| CodecError::new(kind, "scalar field has wrong length"))?;
    Ok(u32::from_le_bytes(bytes))
}

fn decode_u64(kind: RecordKind, body: &[u8]) -> CodecResult<u64> {
    let bytes: [u8; 8] = body
        .try_into()
        .map_err(|_| CodecError::new(kind, "scalar field has wrong length"))?;
    Ok(u64::from_le_bytes(bytes))
}

fn decode_string(kind: RecordKind, body: &[u8]) -> CodecResult<String> {
    String::from_utf8(body.to_vec())
        .map_err(|_| CodecError::new(kind, "string field is not valid UTF-8"))
}

fn decode_move_list(kind: RecordKind, body: &[u8]) -> CodecResult<MoveSequence> {
    body.iter()
        .map(|&raw| {
            Move::from_index(raw)
                .map_err(|_| CodecError::new(kind, format!("invalid move byte {raw}")))
        })
        .collect()
}

fn encode_timed_moves(moves: &TimedMoveSequence) -> Vec<u8> {
    let mut buf = Vec::with_capacity(moves.len() * 5);
    for timed in moves.moves() {
        buf.push(timed.mv.index());
        buf.extend_from_slice(&timed.at_ms.to_le_bytes());
    }
    buf
}

fn decode_timed_moves(kind: RecordKind, body: &[u8]) -> CodecResult<TimedMoveSequence> {
    if body.len() % 5 != 0 {
        return Err(CodecError::new(kind, "timed move list has partial entry"));
    }
    let mut moves = TimedMoveSequence::default();
    for entry in body.chunks_exact(5) {
        let mv = Move::from_index(entry[0])
            .map_err(|_| CodecError::new(kind, format!("invalid move byte {}", entry[0])))?;
        let at_ms = u32::from_le_bytes([entry[1], entry[2], entry[3], entry[4]]);
        moves.push(TimedMove::new(mv, at_ms));
    }
    Ok(moves)
}

fn encode_splits(splits: &SplitTimes) -> Vec<u8> {
    let mut buf = Vec::with_capacity(32);
    buf.extend_from_slice(&splits.cross_ms.to_le_bytes());
    for pair in splits.f2l_pair_ms {
        buf.extend_from_slice(&pair.to_le_bytes());
    }
    buf.extend_from_slice(&splits.oll_cross_ms.to_le_bytes());
    buf.extend_from_slice(&splits.oll_finish_ms.to_le_bytes());
    buf.extend_from_slice(&splits.pll_corner_ms.to_le_bytes());
    buf
}

fn decode_splits(kind: RecordKind, body: &[u8]) -> CodecResult<SplitTimes> {
    if body.len() != 32 {
        return Err(CodecError::new(kind, "split times field has wrong length"));
    }
    let mut values = [0u32; 8];
    for (i, chunk) in body.chunks_exact(4).enumerate() {
        values[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(SplitTimes {
        cross_ms: values[0],
        f2l_pair_ms: [values[1], values[2], values[3], values[4]],
        oll_cross_ms: values[5],
        oll_finish_ms: values[6],
        pll_corner_ms: values[7],
    })
}

fn encode_sync(stamp: &SyncStamp) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(stamp.id.len() as u32).to_le_bytes());
    buf.extend_from_slice(stamp.id.as_bytes());
    buf.extend_from_slice(&stamp.date.to_le_bytes());
    buf.extend_from_slice(&(stamp.sync.len() as u32).to_le_bytes());
    buf.extend_from_slice(stamp.sync.as_bytes());
    buf
}

fn decode_sync(kind: RecordKind, body: &[u8]) -> CodecResult<SyncStamp> {
    let mut offset = 0usize;
    let id = take_string(kind, body, &mut offset)?;
    let date_bytes = take(kind, body, &mut offset, 8)?;
    let date = u64::from_le_bytes([
        date_bytes[0],
        date_bytes[1],
        date_bytes[2],
        date_bytes[3],
        date_bytes[4],
        date_bytes[5],
        date_bytes[6],
        date_bytes[7],
    ]);
    let sync = take_string(kind, body, &mut offset)?;
    if offset != body.len() {
        return Err(CodecError::new(kind, "sync record has trailing bytes"));
    }
    Ok(SyncStamp { id, date, sync })
}

fn take<'a>(
    kind: RecordKind,
    body: &'a [u8],
    offset: &mut usize,
    len: usize,
) -> CodecResult<&'a [u8]> {
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= body.len())
        .ok_or_else(|| CodecError::new(kind, "sync record truncated"))?;
    let slice = &body[*offset..end];
    *offset = end;
    Ok(slice)
}

fn take_string(kind: RecordKind, body: &[u8], offset: &mut usize) -> CodecResult<String> {
    let len_bytes = take(kind, body, offset, 4)?;
    let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    let bytes = take(kind, body, offset, len)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| CodecError::new(kind, "string field is not valid UTF-8"))
}

/// Synthesize the sync record when absent or incomplete, per the open
/// protocol: a record written before sync support still loads cleanly.
fn normalize_sync(
    update: Option<SyncStamp>,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
) -> SyncStamp {
    match update {
        Some(mut stamp) => {
            if stamp.id.is_empty() {
                stamp.id = id_gen.generate_id();
            }
            stamp
        }
        None => SyncStamp {
            id: id_gen.generate_id(),
            date: clock.now_secs(),
            sync: String::new(),
        },
    }
}

pub fn encode_solve(solve: &Solve) -> Vec<u8> {
    let mut fields = FieldWriter::new();
    let scramble: Vec<u8> = solve.scramble.iter().map(Move::index).collect();
    fields.field(SOLVE_SCRAMBLE, &scramble);
    fields.u64_field(SOLVE_CREATED, solve.created);
    fields.u8_field(SOLVE_OK, solve.ok as u8);
    fields.u32_field(SOLVE_TIME, solve.time_ms);
    fields.u32_field(SOLVE_PENALTY, solve.penalty_ms);
    fields.str_field(SOLVE_DEVICE, &solve.device);
    fields.field(SOLVE_MOVES, &encode_timed_moves(&solve.moves));
    fields.field(SOLVE_SPLITS, &encode_splits(&solve.splits));
    fields.field(SOLVE_UPDATE, &encode_sync(&solve.update));
    encode_envelope(RecordKind::Solve, &fields.finish())
}

pub fn decode_solve(
    data: &[u8],
    id: SolveId,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
) -> CodecResult<Solve> {
    const KIND: RecordKind = RecordKind::Solve;
    let payload = decode_envelope(KIND, data)?;

    let mut scramble = MoveSequence::default();
    let mut created = 0;
    let mut ok = false;
    let mut time_ms = 0;
    let mut penalty_ms = 0;
    let mut device = String::new();
    let mut moves = TimedMoveSequence::default();
    let mut splits = SplitTimes::default();
    let mut update = None;

    let mut fields = FieldReader::new(KIND, payload);
    while let Some((field, body)) = fields.next()? {
        match field {
            SOLVE_SCRAMBLE => scramble = decode_move_list(KIND, body)?,
            SOLVE_CREATED => created = decode_u64(KIND, body)?,
            SOLVE_OK => ok = decode_u8(KIND, body)? != 0,
            SOLVE_TIME => time_ms = decode_u32(KIND, body)?,
            SOLVE_PENALTY => penalty_ms = decode_u32(KIND, body)?,
            SOLVE_DEVICE => device = decode_string(KIND, body)?,
            SOLVE_MOVES => moves = decode_timed_moves(KIND, body)?,
            SOLVE_SPLITS => splits = decode_splits(KIND, body)?,
            SOLVE_UPDATE => update = Some(decode_sync(KIND, body)?),
            _ => {}
        }
    }

    Ok(Solve {
        id,
        scramble,
        created,
        ok,
        time_ms,
        penalty_ms,
        device,
        moves,
        splits,
        update: normalize_sync(update, id_gen, clock),
        dirty: false,
    })
}

pub fn encode_session(session: &Session) -> Vec<u8> {
    let mut fields = FieldWriter::new();
    fields.u8_field(SESSION_TYPE, session.solve_type.wire());
    fields.str_field(SESSION_NAME, &session.name);
    fields.field(SESSION_UPDATE, &encode_sync(&session.update));
    encode_envelope(RecordKind::Session, &fields.finish())
}

pub fn decode_session(
    data: &[u8],
    id: SessionId,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
) -> CodecResult<Session> {
    const KIND: RecordKind = RecordKind::Session;
    let payload = decode_envelope(KIND, data)?;

    let mut solve_type = SolveType::Standard3x3x3;
    let mut name = String::new();
    let mut update = None;

    let mut fields = FieldReader::new(KIND, payload);
    while let Some((field, body)) = fields.next()? {
        match field {
            SESSION_TYPE => {
                let raw = decode_u8(KIND, body)?;
                solve_type = SolveType::from_wire(raw)
                    .ok_or_else(|| CodecError::new(KIND, format!("unknown solve type {raw}")))?;
            }
            SESSION_NAME => name = decode_string(KIND, body)?,
            SESSION_UPDATE => update = Some(decode_sync(KIND, body)?),
            _ => {}
        }
    }

    Ok(Session {
        id,
        name,
        solve_type,
        solves: Vec::new(),
        update: normalize_sync(update, id_gen, clock),
        dirty: false,
    })
}

pub fn encode_solve_list(session: &Session) -> Vec<u8> {
    let mut fields = FieldWriter::new();
    for solve in &session.solves {
        fields.str_field(LIST_ENTRY, solve.id.as_str());
    }
    encode_envelope(RecordKind::SolveList, &fields.finish())
}

pub fn decode_solve_list(data: &[u8]) -> CodecResult<Vec<SolveId>> {
    const KIND: RecordKind = RecordKind::SolveList;
    let payload = decode_envelope(KIND, data)?;
    let mut list = Vec::new();
    let mut fields = FieldReader::new(KIND, payload);
    while let Some((field, body)) = fields.next()? {
        if field == LIST_ENTRY {
            list.push(SolveId::new(decode_string(KIND, body)?));
        }
    }
    Ok(list)
}

pub fn encode_session_list<'a>(sessions: impl Iterator<Item = &'a Session>) -> Vec<u8> {
    let mut fields = FieldWriter::new();
    for session in sessions {
        fields.str_field(LIST_ENTRY, session.id.as_str());
    }
    encode_envelope(RecordKind::SessionList, &fields.finish())
}

pub fn decode_session_list(data: &[u8]) -> CodecResult<Vec<SessionId>> {
    const KIND: RecordKind = RecordKind::SessionList;
    let payload = decode_envelope(KIND, data)?;
    let mut list = Vec::new();
    let mut fields = FieldReader::new(KIND, payload);
    while let Some((field, body)) = fields.next()? {
        if field == LIST_ENTRY {
            list.push(SessionId::new(decode_string(KIND, body)?));
        }
    }
    Ok(list)
}
