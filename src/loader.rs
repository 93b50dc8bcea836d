use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use serde_json::{Number, Value};
use tracing::{debug, info, instrument};

use crate::column::Column;
use crate::domain::RVError;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
    JSON,
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    file_type: FileType,
}

/// Records of one data file together with the columns found in it.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub name: String,
    pub records: Vec<Record>,
    pub columns: Vec<Column>,
}

// One frame column converted to json values.
struct LoadedColumn {
    name: String,
    numeric: bool,
    values: Vec<Value>,
}

#[instrument]
pub fn load_data_file(path: PathBuf) -> Result<LoadedData, RVError> {
    let file_info = get_file_info(path)?;
    let start_time = Instant::now();

    let (records, columns) = match file_info.file_type {
        FileType::JSON => load_json(&file_info.path)?,
        FileType::CSV => load_frame(load_csv(&file_info.path)?)?,
        FileType::PARQUET => load_frame(load_parquet(&file_info.path)?)?,
        FileType::ARROW => load_frame(load_arrow(&file_info.path)?)?,
    };

    info!(
        "Loading {} records ({} bytes) took {}ms ...",
        records.len(),
        file_info.file_size,
        start_time.elapsed().as_millis()
    );

    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();
    Ok(LoadedData {
        name,
        records,
        columns,
    })
}

fn detect_file_type(path: &Path) -> Result<FileType, RVError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        Some("JSON") => Ok(FileType::JSON),
        _ => Err(RVError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, RVError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RVError::FileNotFound,
        ErrorKind::PermissionDenied => RVError::PermissionDenied,
        _ => RVError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(RVError::LoadingFailed("Not a file!".into()));
    }

    let file_size = metadata.len();
    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size,
        file_type,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

/// Accepts a json array of objects, or an object holding it under `records`.
fn load_json(path: &Path) -> Result<(Vec<Record>, Vec<Column>), RVError> {
    let text = fs::read_to_string(path)?;
    let items = match serde_json::from_str::<Value>(&text)? {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("records") {
            Some(Value::Array(items)) => items,
            _ => return Err(RVError::LoadingFailed("Expected a list of records".into())),
        },
        _ => return Err(RVError::LoadingFailed("Expected a list of records".into())),
    };
    let records: Vec<Record> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    let mut columns: Vec<Column> = Vec::new();
    for record in records.iter() {
        for (name, value) in record.iter() {
            if !columns.iter().any(|c| &c.field_name == name) {
                columns.push(Column::inferred(name, value.is_number()));
            }
        }
    }
    Ok((records, columns))
}

// Each column is converted in its own thread, rows are assembled afterwards.
fn load_frame(frame: LazyFrame) -> Result<(Vec<Record>, Vec<Column>), RVError> {
    let df = Arc::new(frame.collect()?);
    let loaded: Result<Vec<LoadedColumn>, PolarsError> = df
        .get_column_names()
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect();
    let loaded = loaded?;

    let nrows = df.height();
    let records: Vec<Record> = (0..nrows)
        .into_par_iter()
        .map(|row| {
            loaded
                .iter()
                .map(|c| (c.name.clone(), c.values[row].clone()))
                .collect::<Record>()
        })
        .collect();
    let columns = loaded
        .iter()
        .map(|c| Column::inferred(&c.name, c.numeric))
        .collect();
    Ok((records, columns))
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<LoadedColumn, PolarsError> {
    let dtype = df.column(col_name)?.dtype().clone();
    let numeric = is_numeric_type(&dtype);
    let integer = numeric && !matches!(dtype, DataType::Float32 | DataType::Float64);

    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    let values = series
        .into_iter()
        .map(|value| match value {
            None => Value::Null,
            Some(s) if integer => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(s.to_string())),
            Some(s) if numeric => s
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(s.to_string())),
            Some(s) => Value::String(s.to_string()),
        })
        .collect();
    debug!("Column \"{}\" {:?}", col_name, dtype);

    Ok(LoadedColumn {
        name: col_name.to_string(),
        numeric,
        values,
    })
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}
