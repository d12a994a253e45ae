//! Request paths with their matrix parameters split off.
//!
//! `/cars;color=red/mercedes;year=2020` is matched as `/cars/mercedes`, the
//! `;k=v` pairs stay reachable per segment through the offsets of the
//! stripped path.

/// One path segment of a [`MatrixPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    start: usize,
    end: usize,
    params: Vec<(String, Option<String>)>,
}

impl Segment {
    /// Byte range of the segment in the stripped path, separator excluded.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    pub fn params(&self) -> &[(String, Option<String>)] {
        &self.params
    }
}

/// A request path split into its matrix-stripped form and per segment
/// matrix parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatrixPath {
    stripped: String,
    segments: Vec<Segment>,
}

impl MatrixPath {
    pub fn parse(path: &str) -> Self {
        let mut stripped = String::with_capacity(path.len());
        let mut segments = vec![];

        for (index, raw_segment) in path.split('/').enumerate() {
            if index > 0 {
                stripped.push('/');
            }

            let (base, matrix) = match raw_segment.split_once(';') {
                Some((base, matrix)) => (base, Some(matrix)),
                None => (raw_segment, None),
            };

            let start = stripped.len();
            stripped.push_str(base);
            let params = matrix
                .into_iter()
                .flat_map(|matrix| matrix.split(';'))
                .filter(|param| !param.is_empty())
                .map(|param| match param.split_once('=') {
                    Some((name, value)) => (name.to_string(), Some(value.to_string())),
                    None => (param.to_string(), None),
                })
                .collect();

            segments.push(Segment { start, end: stripped.len(), params });
        }

        Self { stripped, segments }
    }

    /// The path without any matrix parameter.
    pub fn stripped(&self) -> &str {
        &self.stripped
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Finds the segment containing the byte `offset` of the stripped path.
    pub fn segment_at(&self, offset: usize) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.start <= offset && offset <= segment.end && segment.start != segment.end)
    }

    pub fn has_matrix_params(&self) -> bool {
        self.segments.iter().any(|segment| !segment.params.is_empty())
    }
}
