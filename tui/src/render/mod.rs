pub(crate) mod line_utils;
