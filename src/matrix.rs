use std::{
    fmt,
    ops::{Add, Div, Index, IndexMut, Mul, Neg, Sub},
};

use crate::{
    error::{Error, Result},
    random::RandomSource,
};

/// Right-hand side of a matrix operation: either a scalar broadcast to every
/// element or another matrix combined position-wise.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Scalar(f64),
    Matrix(&'a Matrix),
}

impl Operand<'_> {
    // Guard for operations that are only defined against a scalar.
    fn scalar(self, operation: &'static str) -> Result<f64> {
        match self {
            Operand::Scalar(v) => Ok(v),
            Operand::Matrix(m) => Err(Error::TypeMismatch {
                operation,
                shape: m.shape(),
            }),
        }
    }
}

impl From<f64> for Operand<'_> {
    fn from(v: f64) -> Self {
        Operand::Scalar(v)
    }
}

impl<'a> From<&'a Matrix> for Operand<'a> {
    fn from(m: &'a Matrix) -> Self {
        Operand::Matrix(m)
    }
}

/// Dense, row-major matrix of `f64` with at least one row and one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a `rows x cols` matrix whose elements are all `value`.
    pub fn filled(value: f64, rows: usize, cols: usize) -> Result<Self> {
        Self::from_shape_vec(rows, cols, vec![value; rows * cols])
    }

    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        Self::filled(0.0, rows, cols)
    }

    /// Create a matrix from row-major `data`.
    pub fn from_shape_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::EmptyMatrix { rows, cols });
        }
        if data.len() != rows * cols {
            return Err(Error::InvalidArgument(format!(
                "{} elements cannot fill a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a matrix from a list of rows. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if n_rows == 0 || n_cols == 0 {
            return Err(Error::EmptyMatrix {
                rows: n_rows,
                cols: n_cols,
            });
        }

        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(Error::RaggedRows {
                    row: i,
                    len: row.len(),
                    expected: n_cols,
                });
            }
            data.extend(row);
        }
        Self::from_shape_vec(n_rows, n_cols, data)
    }

    /// Create a column vector of shape `(values.len(), 1)`.
    pub fn column(values: Vec<f64>) -> Result<Self> {
        Self::from_shape_vec(values.len(), 1, values)
    }

    /// Create a `rows x cols` matrix drawing each element from `[-1, 1)`.
    pub fn random_uniform<R>(rows: usize, cols: usize, rng: &mut R) -> Result<Self>
    where
        R: RandomSource + ?Sized,
    {
        let data = (0..rows * cols).map(|_| rng.next_uniform()).collect();
        Self::from_shape_vec(rows, cols, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    /// Elements in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.data.iter()
    }

    /// Copy the elements into a list of rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }

    pub fn t(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.size());
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self[(r, c)]);
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Apply `f` to every element.
    pub fn map<F>(&self, f: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Apply `f` on the corresponding pairs of elements of `m1` and `m2`.
    pub fn interleave<F>(f: F, m1: &Matrix, m2: &Matrix) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        Matrix::zip_with(f, m1, m2, "interleave")
    }

    fn zip_with<F>(f: F, m1: &Matrix, m2: &Matrix, operation: &'static str) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        m1.ensure_same_shape(m2, operation)?;
        Ok(Matrix {
            rows: m1.rows,
            cols: m1.cols,
            data: m1
                .data
                .iter()
                .zip(m2.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    fn ensure_same_shape(&self, other: &Matrix, operation: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                operation,
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    fn combine<'a, F>(&self, rhs: Operand<'a>, operation: &'static str, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        match rhs {
            Operand::Scalar(s) => Ok(self.map(|v| f(v, s))),
            Operand::Matrix(m) => Matrix::zip_with(f, self, m, operation),
        }
    }

    pub fn add<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Matrix> {
        self.combine(rhs.into(), "add", |a, b| a + b)
    }

    pub fn sub<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Matrix> {
        self.combine(rhs.into(), "sub", |a, b| a - b)
    }

    /// Multiply by a scalar, or elementwise by a matrix of the same shape.
    pub fn mul<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Matrix> {
        self.combine(rhs.into(), "mul", |a, b| a * b)
    }

    pub fn div<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Matrix> {
        let rhs: Operand = rhs.into();
        let s = rhs.scalar("div")?;
        if s == 0.0 {
            return Err(Error::InvalidArgument("division by zero".into()));
        }
        Ok(self.map(|v| v / s))
    }

    /// Raise every element to `exponent`.
    pub fn pow<'a>(&self, exponent: impl Into<Operand<'a>>) -> Result<Matrix> {
        let exponent: Operand = exponent.into();
        let e = exponent.scalar("pow")?;
        if e < 0.0 && self.data.contains(&0.0) {
            return Err(Error::InvalidArgument(format!(
                "zero raised to negative power {}",
                e
            )));
        }
        if e.fract() == 0.0 && e.abs() <= i32::MAX as f64 {
            let e = e as i32;
            Ok(self.map(|v| v.powi(e)))
        } else {
            Ok(self.map(|v| v.powf(e)))
        }
    }

    /// Modular exponentiation of every element: `v^exponent mod modulus`.
    ///
    /// Elements must be integral. Negative elements are reduced into
    /// `[0, modulus)` first, so results are always non-negative.
    pub fn pow_mod(&self, exponent: u64, modulus: u64) -> Result<Matrix> {
        if modulus == 0 {
            return Err(Error::InvalidArgument("modulus must be non-zero".into()));
        }
        if let Some(&v) = self
            .data
            .iter()
            .find(|v| v.fract() != 0.0 || v.abs() > i64::MAX as f64)
        {
            return Err(Error::InvalidArgument(format!(
                "modular power needs integral elements, found {}",
                v
            )));
        }
        Ok(self.map(|v| {
            let base = (v as i128).rem_euclid(modulus as i128) as u128;
            mod_pow(base, exponent, modulus as u128) as f64
        }))
    }

    fn compare<'a, F>(&self, rhs: Operand<'a>, operation: &'static str, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> bool,
    {
        let s = rhs.scalar(operation)?;
        Ok(self.map(|v| if f(v, s) { 1.0 } else { 0.0 }))
    }

    pub fn lt<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Matrix> {
        self.compare(rhs.into(), "lt", |a, b| a < b)
    }

    pub fn le<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Matrix> {
        self.compare(rhs.into(), "le", |a, b| a <= b)
    }

    pub fn gt<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Matrix> {
        self.compare(rhs.into(), "gt", |a, b| a > b)
    }

    pub fn ge<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Matrix> {
        self.compare(rhs.into(), "ge", |a, b| a >= b)
    }

    pub fn equal<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Matrix> {
        self.compare(rhs.into(), "equal", |a, b| a == b)
    }

    pub fn not_equal<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Matrix> {
        self.compare(rhs.into(), "not_equal", |a, b| a != b)
    }

    /// Component-wise maximum of `m1` and either a scalar or a matrix of the same shape.
    pub fn maximum<'a>(m1: &Matrix, m2: impl Into<Operand<'a>>) -> Result<Matrix> {
        m1.combine(m2.into(), "maximum", f64::max)
    }

    /// Position `(row, col)` of the largest element.
    /// Ties resolve to the earliest position in row-major order.
    pub fn argmax(&self) -> (usize, usize) {
        let mut index = 0;
        let mut max = self.data[0];
        for (i, &v) in self.data.iter().enumerate().skip(1) {
            if v > max {
                max = v;
                index = i;
            }
        }
        (index / self.cols, index % self.cols)
    }

    /// Matrix product `self * rhs`.
    pub fn dot(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(Error::ShapeMismatch {
                operation: "dot",
                left: self.shape(),
                right: rhs.shape(),
            });
        }

        let mut data = Vec::with_capacity(self.rows * rhs.cols);
        for r in 0..self.rows {
            let row = &self.data[r * self.cols..(r + 1) * self.cols];
            for c in 0..rhs.cols {
                let mut sum = 0.0;
                for (i, &v) in row.iter().enumerate() {
                    sum += v * rhs[(i, c)];
                }
                data.push(sum);
            }
        }
        Ok(Matrix {
            rows: self.rows,
            cols: rhs.cols,
            data,
        })
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.sum() / self.size() as f64
    }

    /// `self <- self - factor * other`, updating in place.
    pub fn scaled_sub_assign(&mut self, factor: f64, other: &Matrix) -> Result<()> {
        self.ensure_same_shape(other, "scaled_sub_assign")?;
        self.data
            .iter_mut()
            .zip(other.data.iter())
            .for_each(|(v, &o)| *v -= factor * o);
        Ok(())
    }
}

fn mod_pow(mut base: u128, mut exponent: u64, modulus: u128) -> u128 {
    let mut result = 1 % modulus;
    base %= modulus;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result * base % modulus;
        }
        base = base * base % modulus;
        exponent >>= 1;
    }
    result
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        assert!(r < self.rows && c < self.cols, "index out of bounds");
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        assert!(r < self.rows && c < self.cols, "index out of bounds");
        &mut self.data[r * self.cols + c]
    }
}

impl Add<f64> for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: f64) -> Matrix {
        self.map(|v| v + rhs)
    }
}

impl Sub<f64> for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: f64) -> Matrix {
        self.map(|v| v - rhs)
    }
}

impl Mul<f64> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: f64) -> Matrix {
        self.map(|v| v * rhs)
    }
}

impl Mul<&Matrix> for f64 {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        rhs.map(|v| self * v)
    }
}

impl Div<f64> for &Matrix {
    type Output = Matrix;

    fn div(self, rhs: f64) -> Matrix {
        self.map(|v| v / rhs)
    }
}

impl Neg for &Matrix {
    type Output = Matrix;

    fn neg(self) -> Matrix {
        self.map(|v| -v)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.data.chunks(self.cols).enumerate() {
            if i > 0 {
                write!(f, ",\n ")?;
            }
            write!(f, "[")?;
            for (j, v) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", v)?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
