use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Parser, ValueEnum};
use csv::{ByteRecord, WriterBuilder};
use serde_json::{Map, Value as JsonValue};
use tracing::{error, info, warn};

use csvcolumn::{
    ColumnReader, FieldCount, Float, Int, Position, ReadOptions, RecordSource, Scan, Slot, Text,
    logger,
};

#[derive(Parser)]
#[command(
    name = "csvcol",
    version,
    about = "Extract typed named columns from delimited text"
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input file, or `-` for stdin.
    input: PathBuf,

    /// Column to extract as NAME[:text|int|float]; repeat for more columns.
    #[arg(short, long = "column", required = true)]
    columns: Vec<ColumnSpec>,

    /// Input field delimiter.
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Skip lines starting with this character.
    #[arg(long)]
    comment: Option<char>,

    /// Treat quote characters as ordinary text.
    #[arg(long)]
    no_quoting: bool,

    /// Require exactly N fields in every record.
    #[arg(long, conflicts_with = "flexible")]
    fields: Option<usize>,

    /// Allow records of varying length.
    #[arg(long)]
    flexible: bool,

    /// Strip leading whitespace from every field.
    #[arg(long)]
    trim_leading_space: bool,

    /// Match header names exactly instead of ignoring case.
    #[arg(long)]
    case_sensitive_header: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Keep writing rows after a conversion error; failed cells are left empty.
    #[arg(long)]
    keep_going: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Tsv,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Int,
    Float,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ColumnSpec {
    name: String,
    kind: ColumnKind,
}

impl FromStr for ColumnSpec {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (name, kind) = match spec.rsplit_once(':') {
            Some((name, "text")) => (name, ColumnKind::Text),
            Some((name, "int")) => (name, ColumnKind::Int),
            Some((name, "float")) => (name, ColumnKind::Float),
            Some((_, other)) => {
                return Err(format!(
                    "unknown column type '{other}' (expected text, int or float)"
                ));
            }
            None => (spec, ColumnKind::Text),
        };
        if name.is_empty() {
            return Err("column name may not be empty".to_owned());
        }
        Ok(Self {
            name: name.to_owned(),
            kind,
        })
    }
}

enum Bound {
    Text(Slot<Text>),
    Int(Slot<Int>),
    Float(Slot<Float>),
}

impl Bound {
    fn failed(&self) -> bool {
        match self {
            Self::Text(_) => false,
            Self::Int(slot) => slot.last_error().is_some(),
            Self::Float(slot) => slot.last_error().is_some(),
        }
    }

    fn to_json(&self) -> JsonValue {
        if self.failed() {
            return JsonValue::Null;
        }
        match self {
            Self::Text(slot) => JsonValue::String(slot.value()),
            Self::Int(slot) => JsonValue::from(slot.value()),
            Self::Float(slot) => serde_json::Number::from_f64(slot.value())
                .map_or(JsonValue::Null, JsonValue::Number),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        if self.failed() {
            return;
        }
        match self {
            Self::Text(slot) => out.extend_from_slice(slot.borrow().as_str().as_bytes()),
            Self::Int(slot) => {
                let mut buffer = itoa::Buffer::new();
                out.extend_from_slice(buffer.format(slot.value()).as_bytes());
            }
            Self::Float(slot) => {
                let mut buffer = ryu::Buffer::new();
                out.extend_from_slice(buffer.format(slot.value()).as_bytes());
            }
        }
    }
}

type AnyError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();
    logger::init(cli.verbose, cli.log_file.as_deref())?;
    if let Err(err) = run(&cli) {
        error!("{err}");
        return Err(err);
    }
    Ok(())
}

fn read_options(cli: &Cli) -> Result<ReadOptions, AnyError> {
    let fields = match (cli.fields, cli.flexible) {
        (Some(count), _) => FieldCount::Exact(count),
        (None, true) => FieldCount::Any,
        (None, false) => FieldCount::FirstRecord,
    };
    Ok(ReadOptions::new()
        .with_delimiter(ascii_byte(cli.delimiter, "--delimiter")?)
        .with_comment(cli.comment.map(|c| ascii_byte(c, "--comment")).transpose()?)
        .with_quoting(!cli.no_quoting)
        .with_fields_per_record(fields)
        .with_trim_leading_space(cli.trim_leading_space)
        .with_case_sensitive_header(cli.case_sensitive_header))
}

fn ascii_byte(c: char, flag: &str) -> Result<u8, AnyError> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| format!("{flag} must be a single ASCII character, got '{c}'").into())
}

fn open_input(cli: &Cli) -> Result<Box<dyn Read>, AnyError> {
    if cli.input.as_os_str() == "-" {
        Ok(Box::new(io::stdin().lock()))
    } else {
        Ok(Box::new(File::open(&cli.input).map_err(|err| {
            format!("failed to open {}: {err}", cli.input.display())
        })?))
    }
}

fn run(cli: &Cli) -> Result<(), AnyError> {
    let options = read_options(cli)?;
    let mut reader = ColumnReader::from_reader_with_options(open_input(cli)?, &options);
    let bound: Vec<Bound> = cli
        .columns
        .iter()
        .map(|spec| match spec.kind {
            ColumnKind::Text => Bound::Text(reader.text(spec.name.as_str())),
            ColumnKind::Int => Bound::Int(reader.int(spec.name.as_str())),
            ColumnKind::Float => Bound::Float(reader.float(spec.name.as_str())),
        })
        .collect();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let written = match cli.format {
        OutputFormat::Json => write_json(&mut reader, &bound, cli.keep_going, &mut out)?,
        OutputFormat::Csv => write_delimited(&mut reader, &bound, b',', cli.keep_going, &mut out)?,
        OutputFormat::Tsv => write_delimited(&mut reader, &bound, b'\t', cli.keep_going, &mut out)?,
    };
    out.flush()?;
    info!(rows = written, "done");

    reader.finish()?;
    Ok(())
}

/// Advances to the next row worth writing. Stops at the first latched error
/// unless `keep_going` is set; source failures end iteration regardless.
///
/// Absent columns are reported once, after the header is resolved.
fn next_row<S: RecordSource>(
    reader: &mut ColumnReader<S>,
    keep_going: bool,
    warned: &mut bool,
) -> bool {
    if !reader.advance() {
        return false;
    }
    if !*warned {
        for (name, _) in reader
            .bindings()
            .filter(|(_, position)| *position == Position::Absent)
        {
            warn!(column = name, "column not found in header; output will be empty");
        }
        *warned = true;
    }
    keep_going || reader.error().is_none()
}

fn write_delimited<S: RecordSource, W: Write>(
    reader: &mut ColumnReader<S>,
    bound: &[Bound],
    delimiter: u8,
    keep_going: bool,
    out: W,
) -> Result<u64, AnyError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(out);
    let header: ByteRecord = reader.bindings().map(|(name, _)| name.as_bytes()).collect();
    writer.write_byte_record(&header)?;

    let mut record = ByteRecord::new();
    let mut scratch: Vec<Vec<u8>> = vec![Vec::new(); bound.len()];
    let mut warned = false;
    let mut written = 0u64;
    while next_row(reader, keep_going, &mut warned) {
        record.clear();
        let covered = reader.row_coverage();
        for ((column, buffer), found) in bound.iter().zip(scratch.iter_mut()).zip(covered) {
            buffer.clear();
            if found {
                column.encode(buffer);
            }
            record.push_field(buffer.as_slice());
        }
        writer.write_byte_record(&record)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

fn write_json<S: RecordSource, W: Write>(
    reader: &mut ColumnReader<S>,
    bound: &[Bound],
    keep_going: bool,
    mut out: W,
) -> Result<u64, AnyError> {
    let names: Vec<String> = reader.bindings().map(|(name, _)| name.to_owned()).collect();
    let mut warned = false;
    let mut written = 0u64;
    while next_row(reader, keep_going, &mut warned) {
        let row: Map<String, JsonValue> = names
            .iter()
            .zip(bound)
            .zip(reader.row_coverage())
            .map(|((name, column), found)| {
                let value = if found { column.to_json() } else { JsonValue::Null };
                (name.clone(), value)
            })
            .collect();
        serde_json::to_writer(&mut out, &row)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    Ok(written)
}
