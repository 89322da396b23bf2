#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub code_num: u16,
    pub message: &'static str,
}

impl Status {
    pub const OK: Status = Status {
        code_num: 200,
        message: "OK",
    };
    pub const NO_CONTENT: Status = Status {
        code_num: 204,
        message: "No Content",
    };
    pub const BAD_REQUEST: Status = Status {
        code_num: 400,
        message: "Bad Request",
    };
    pub const UNAUTHORIZED: Status = Status {
        code_num: 401,
        message: "Unauthorized",
    };
    pub const NOT_FOUND: Status = Status {
        code_num: 404,
        message: "Not Found",
    };
    pub const INTERNAL_SERVER_ERROR: Status = Status {
        code_num: 500,
        message: "Internal Server Error",
    };
}
