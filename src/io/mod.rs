//! Comma separated job files and triplet output.
//!
//! A job file starts with `<op>,<n>` where `op` is `A` (add), `M` (multiply),
//! `T` (transpose) or `S` (scalar multiply). The second line is a separator
//! and is ignored. Triplet lines `row,col,value` follow; for `A`, `M` and `S`
//! a `,,` line ends the first matrix and is followed by the second matrix's
//! triplets or, for `S`, by the scalar factor. Blank lines are skipped.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use log::{debug, info, warn};

use crate::sparse::{MatrixNonZero, MatrixSum};
use crate::{Direction, MatrixValue, Result, SparseMatrix};

pub type Triplet<T> = (usize, usize, T);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Multiply,
    Transpose,
    ScalarMultiply,
}

impl Operation {
    pub fn from_code(code: &str) -> anyhow::Result<Self> {
        match code {
            "A" => Ok(Operation::Add),
            "M" => Ok(Operation::Multiply),
            "T" => Ok(Operation::Transpose),
            "S" => Ok(Operation::ScalarMultiply),
            other => bail!("Unknown operation code {other:?}, expected one of A, M, T, S"),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Add => "addition",
            Operation::Multiply => "multiplication",
            Operation::Transpose => "transposition",
            Operation::ScalarMultiply => "scalar multiplication",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task<T> {
    Add(Vec<Triplet<T>>, Vec<Triplet<T>>),
    Multiply(Vec<Triplet<T>>, Vec<Triplet<T>>),
    Transpose(Vec<Triplet<T>>),
    ScalarMultiply(Vec<Triplet<T>>, T),
}

/// A parsed job: the matrix size and the operation with its operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job<T> {
    pub size: usize,
    pub task: Task<T>,
}

impl<T: MatrixValue> Job<T> {
    pub fn operation(&self) -> Operation {
        match self.task {
            Task::Add(..) => Operation::Add,
            Task::Multiply(..) => Operation::Multiply,
            Task::Transpose(..) => Operation::Transpose,
            Task::ScalarMultiply(..) => Operation::ScalarMultiply,
        }
    }

    /// Builds the operand matrices and applies the operation.
    ///
    /// Repeated coordinates in one operand keep the last value.
    pub fn run(&self) -> Result<SparseMatrix<T>> {
        match &self.task {
            Task::Add(left, right) => self.load(left)?.add(&self.load(right)?),
            Task::Multiply(left, right) => self.load(left)?.multiply(&self.load(right)?),
            Task::Transpose(only) => self.load(only)?.transpose(),
            Task::ScalarMultiply(only, factor) => self.load(only)?.scalar_multiply(*factor),
        }
    }

    fn load(&self, triplets: &[Triplet<T>]) -> Result<SparseMatrix<T>> {
        SparseMatrix::from_triplets(self.size, triplets.iter().copied())
    }
}

pub fn read_job<T: MatrixValue>(path: &Path) -> anyhow::Result<Job<T>> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file {}", path.display()))?;
    parse_job(&input).with_context(|| format!("Invalid job file {}", path.display()))
}

pub fn parse_job<T: MatrixValue>(input: &str) -> anyhow::Result<Job<T>> {
    let mut lines = input.lines().enumerate().map(|(i, line)| (i + 1, line.trim()));

    let (number, header) = lines.next().ok_or_else(|| anyhow!("Job file is empty"))?;
    let mut fields = header.split(',').map(str::trim);
    let operation = Operation::from_code(fields.next().unwrap_or_default())
        .with_context(|| format!("line {number}"))?;
    let size: usize = fields
        .next()
        .ok_or_else(|| anyhow!("line {number}: missing matrix size"))?
        .parse()
        .with_context(|| format!("line {number}: invalid matrix size"))?;
    if size == 0 {
        bail!("line {number}: matrix size must be positive");
    }
    if let Some(extra) = fields.find(|field| !field.is_empty()) {
        bail!("line {number}: unexpected field {extra:?} after the matrix size");
    }

    // separator line
    lines.next();
    let body: Vec<(usize, &str)> = lines.filter(|(_, line)| !line.is_empty()).collect();

    let task = match operation {
        Operation::Transpose => Task::Transpose(parse_triplets(&body, size)?),
        Operation::Add | Operation::Multiply | Operation::ScalarMultiply => {
            let split = body
                .iter()
                .position(|(_, line)| is_separator(line))
                .ok_or_else(|| anyhow!("missing ',,' line after the first matrix"))?;
            let left = parse_triplets(&body[..split], size)?;
            let rest = &body[split + 1..];

            match operation {
                Operation::Add => Task::Add(left, parse_triplets(rest, size)?),
                Operation::Multiply => Task::Multiply(left, parse_triplets(rest, size)?),
                _ => {
                    let &(number, line) = rest
                        .first()
                        .ok_or_else(|| anyhow!("missing scalar factor after ',,'"))?;
                    let factor = parse_field(line, number, "scalar factor")?;
                    if rest.len() > 1 {
                        warn!("Ignoring {} lines after the scalar factor", rest.len() - 1);
                    }
                    Task::ScalarMultiply(left, factor)
                }
            }
        }
    };

    debug!("Parsed {operation} job on {size}x{size} matrices");
    Ok(Job { size, task })
}

fn is_separator(line: &str) -> bool {
    line.split(',').all(|field| field.trim().is_empty())
}

fn parse_field<F>(field: &str, number: usize, what: &str) -> anyhow::Result<F>
where
    F: std::str::FromStr,
    F::Err: std::error::Error + Send + Sync + 'static,
{
    field
        .trim()
        .parse()
        .with_context(|| format!("line {number}: invalid {what} {field:?}"))
}

fn parse_triplets<T: MatrixValue>(
    lines: &[(usize, &str)],
    size: usize,
) -> anyhow::Result<Vec<Triplet<T>>> {
    lines
        .iter()
        .map(|&(number, line)| -> anyhow::Result<Triplet<T>> {
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != 3 {
                bail!("line {number}: expected row,col,value but found {line:?}");
            }
            let row: usize = parse_field(fields[0], number, "row")?;
            let col: usize = parse_field(fields[1], number, "column")?;
            let value: T = parse_field(fields[2], number, "value")?;
            if row == 0 || col == 0 || row > size || col > size {
                bail!("line {number}: coordinate ({row}, {col}) is outside 1..={size}");
            }
            Ok((row, col, value))
        })
        .collect()
}

/// Writes one `row,col,value` line per stored entry in row-major order and
/// returns the number of lines written.
pub fn write_triplets<T, W>(matrix: &SparseMatrix<T>, mut writer: W) -> anyhow::Result<usize>
where
    T: MatrixValue,
    W: Write,
{
    let mut written = 0;
    for (row, col, value) in matrix.iter() {
        writeln!(writer, "{row},{col},{value}")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Reads the job at `input`, runs it and writes the result triplets to
/// `output`. Returns the computed matrix.
pub fn run_job_file<T: MatrixValue>(
    input: &Path,
    output: &Path,
) -> anyhow::Result<SparseMatrix<T>> {
    let job: Job<T> = read_job(input)?;
    info!(
        "Running {} on {}x{} matrices from {}",
        job.operation(),
        job.size,
        job.size,
        input.display()
    );

    let result = job
        .run()
        .with_context(|| format!("Failed to run {}", job.operation()))?;

    let file = File::create(output)
        .with_context(|| format!("Failed to create output file {}", output.display()))?;
    let written = write_triplets(&result, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {written} entries to {}", output.display());
    Ok(result)
}

/// Non-zero count and wrapping sum of one row or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSummary<T> {
    pub index: usize,
    pub nonzero: u32,
    pub sum: T,
}

/// Summaries of the non-empty lines along `direction`, in ascending order.
pub fn summarize<T: MatrixValue>(
    matrix: &SparseMatrix<T>,
    direction: Direction,
) -> anyhow::Result<Vec<LineSummary<T>>> {
    let (counts, sums): (Vec<u32>, Vec<T>) = match direction {
        Direction::ROW => (matrix.nonzero_row()?, matrix.sum_row()),
        Direction::COLUMN => (matrix.nonzero_col()?, matrix.sum_col()),
    };
    Ok(counts
        .into_iter()
        .zip(sums)
        .enumerate()
        .filter(|(_, (nonzero, _))| *nonzero > 0)
        .map(|(i, (nonzero, sum))| LineSummary {
            index: i + 1,
            nonzero,
            sum,
        })
        .collect())
}

/// `dir/name.csv` becomes `dir/name_output.csv`; the extension is kept as is.
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{stem}_output.{}", ext.to_string_lossy()),
        None => format!("{stem}_output"),
    };
    input.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ADD_JOB: &str = "A,3\n,,\n1,1,1\n2,2,1\n3,3,1\n,,\n1,2,5\n2,1,7\n3,3,2\n";

    #[test]
    fn test_parse_and_run_add() {
        let job: Job<i64> = parse_job(ADD_JOB).unwrap();
        assert_eq!(job.size, 3);
        assert_eq!(job.operation(), Operation::Add);

        let result = job.run().unwrap();
        let mut out = Vec::new();
        let written = write_triplets(&result, &mut out).unwrap();
        assert_eq!(written, 5);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1,1,1\n1,2,5\n2,1,7\n2,2,1\n3,3,3\n"
        );
    }

    #[test]
    fn test_parse_multiply() {
        let job: Job<i64> = parse_job("M,2\n,,\n1,2,3\n,,\n2,1,4\n").unwrap();
        assert_eq!(
            job.task,
            Task::Multiply(vec![(1, 2, 3)], vec![(2, 1, 4)])
        );
        let result = job.run().unwrap();
        assert_eq!(result.iter().collect::<Vec<_>>(), vec![(1, 1, 12)]);
    }

    #[test]
    fn test_parse_transpose() {
        let job: Job<i64> = parse_job("T,2\n,,\n1,2,3\n\n2,2,-1\n").unwrap();
        assert_eq!(job.task, Task::Transpose(vec![(1, 2, 3), (2, 2, -1)]));
        let result = job.run().unwrap();
        assert_eq!(result.iter().collect::<Vec<_>>(), vec![(2, 1, 3), (2, 2, -1)]);
    }

    #[test]
    fn test_parse_scalar_multiply() {
        let job: Job<i32> = parse_job("S, 2\n,,\n1,1,2\n2,1,-3\n,,\n4\n").unwrap();
        assert_eq!(job.task, Task::ScalarMultiply(vec![(1, 1, 2), (2, 1, -3)], 4));
        let result = job.run().unwrap();
        assert_eq!(result.iter().collect::<Vec<_>>(), vec![(1, 1, 8), (2, 1, -12)]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_job::<i64>("").is_err());
        assert!(parse_job::<i64>("X,3\n,,\n").is_err());
        assert!(parse_job::<i64>("A,0\n,,\n,,\n").is_err());
        assert!(parse_job::<i64>("A,two\n,,\n,,\n").is_err());
        // missing separator
        assert!(parse_job::<i64>("A,2\n,,\n1,1,1\n").is_err());
        // bad arity and bad value
        assert!(parse_job::<i64>("T,2\n,,\n1,1\n").is_err());
        assert!(parse_job::<i64>("T,2\n,,\n1,1,x\n").is_err());
        // coordinate outside the matrix
        let err = parse_job::<i64>("T,2\n,,\n3,1,1\n").unwrap_err();
        assert!(err.to_string().contains("line 3"));
        // missing scalar factor
        assert!(parse_job::<i64>("S,2\n,,\n1,1,1\n,,\n").is_err());
    }

    #[test]
    fn test_header_extra_fields_rejected() {
        let err = parse_job::<i64>("A,3,junk\n,,\n,,\n").unwrap_err();
        assert!(err.to_string().contains("junk"));
        assert!(parse_job::<i64>("T,2,4\n,,\n1,1,1\n").is_err());
        // a trailing comma is tolerated
        assert_eq!(parse_job::<i64>("T,2,\n,,\n1,1,1\n").unwrap().size, 2);
    }

    #[test]
    fn test_run_job_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("job.csv");
        fs::write(&input, ADD_JOB).unwrap();
        let output = output_path(&input);

        let result = run_job_file::<i64>(&input, &output).unwrap();
        assert_eq!(result.nnz(), 5);
        assert_eq!(output, dir.path().join("job_output.csv"));
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "1,1,1\n1,2,5\n2,1,7\n2,2,1\n3,3,3\n"
        );
    }

    #[test]
    fn test_run_job_file_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.csv");
        let err = run_job_file::<i64>(&missing, &dir.path().join("out.csv")).unwrap_err();
        assert!(err.to_string().contains("missing.csv"));

        let input = dir.path().join("job.csv");
        fs::write(&input, ADD_JOB).unwrap();
        let unwritable = dir.path().join("no_such_dir").join("out.csv");
        assert!(run_job_file::<i64>(&input, &unwritable).is_err());
    }

    #[test]
    fn test_summarize() {
        let job: Job<i64> = parse_job(ADD_JOB).unwrap();
        let result = job.run().unwrap();

        let rows = summarize(&result, Direction::ROW).unwrap();
        assert_eq!(
            rows,
            vec![
                LineSummary { index: 1, nonzero: 2, sum: 6 },
                LineSummary { index: 2, nonzero: 2, sum: 8 },
                LineSummary { index: 3, nonzero: 1, sum: 3 },
            ]
        );

        let sparse = SparseMatrix::from_triplets(3, vec![(2, 3, 4i64), (3, 3, -1)]).unwrap();
        assert_eq!(
            summarize(&sparse, Direction::COLUMN).unwrap(),
            vec![LineSummary { index: 3, nonzero: 2, sum: 3 }]
        );
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("data/input.csv")),
            PathBuf::from("data/input_output.csv")
        );
        assert_eq!(output_path(Path::new("job")), PathBuf::from("job_output"));
    }
}
