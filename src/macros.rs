macro_rules! str {
    ($s:expr) => {
        $s.to_string()
    };
}

/// Unwraps an `Option` or returns `None` from the enclosing function.
macro_rules! unless {
    ($ex:expr) => {
        match $ex {
            Some(x) => x,
            None => return None,
        }
    };
}
