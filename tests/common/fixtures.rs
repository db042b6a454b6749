//! Static input corpora used across harnesses.
//!
//! Small corpora are `&'static str` file bodies. The high-volume generators
//! build larger inputs on demand for throughput and drop-accounting tests.

/// A well-formed CSV export with every mandatory column.
pub const CSV_BASIC: &str = "\
message,datetime,timestamp_desc,hostname,tag
Service started,2024-01-15T10:00:00Z,Event Logged,web-01,startup
Login failed,2024-01-15 10:00:01,Event Logged,web-01,\"auth,failure\"
Disk full,2024-01-15T10:00:02.500+00:00,Event Logged,db-01,-
Config reloaded,2024-01-15T12:00:03+02:00,Event Logged,web-02,
";

/// CSV without `datetime`; epochs in mixed units in `timestamp`.
pub const CSV_EPOCHS: &str = "\
a,b,timestamp
seconds,x,1600000000
millis,y,1600000000000
micros,z,1600000000000000
";

/// CSV carrying datastore-internal columns that must be scrubbed.
pub const CSV_INTERNAL_FIELDS: &str = "\
message,datetime,timestamp_desc,_id,_index,_type,_source,__ts_timeline_id,keep
m,2024-01-15T10:00:00Z,d,1,idx,doc,src,7,yes
";

/// JSONL lines in the shapes upload clients produce.
pub const JSONL_BASIC: &str = r#"{"message":"User login","datetime":"2024-01-15T10:00:00Z","timestamp_desc":"Event Logged","user":"alice","tag":["auth"]}
{"message":"File opened","timestamp":1705312801,"timestamp_desc":"Event Logged","path":"/etc/passwd"}

{"message":"Proc spawn","datetime":"2024-01-15 10:00:02,125","timestamp_desc":"Event Logged","tag":"proc,exec","_index":"x"}
"#;

/// A JSONL file whose first line lacks `timestamp_desc`.
pub const JSONL_MISSING_FIELD: &str = r#"{"message":"m","datetime":"2024-01-15T10:00:00Z"}
{"message":"m","datetime":"2024-01-15T10:00:00Z","timestamp_desc":"d"}
"#;

/// A Redline export.
pub const REDLINE_BASIC: &str = "\
\"Alert\",\"Tag\",\"Timestamp\",\"Field\",\"Summary\"
\"HIGH\",\"persistence\",\"2024-01-15 10:00:00\",\"Created\",\"Service installed\"
\"MEDIUM\",\"lateral\",\"01/15/2024 10:05:00\",\"Modified\",\"Share mounted\"
";

/// Build a CSV of `rows` valid events; rows listed in `bad_rows` get an
/// unparseable `datetime`.
pub fn csv_with_bad_rows(rows: usize, bad_rows: &[usize]) -> String {
    let mut out = String::from("message,datetime,timestamp_desc\n");
    for i in 0..rows {
        if bad_rows.contains(&i) {
            out.push_str(&format!("row {i},not a date,Event Logged\n"));
        } else {
            out.push_str(&format!(
                "row {i},2024-01-15T10:{:02}:{:02}Z,Event Logged\n",
                (i / 60) % 60,
                i % 60
            ));
        }
    }
    out
}

/// Build `lines` JSONL events with increasing epoch-second timestamps.
pub fn jsonl_high_volume(lines: usize) -> String {
    (0..lines)
        .map(|i| {
            format!(
                "{{\"message\":\"event {i}\",\"timestamp\":{},\"timestamp_desc\":\"Event Logged\",\"seq\":{i}}}\n",
                1_700_000_000 + i
            )
        })
        .collect()
}
