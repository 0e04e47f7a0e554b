pub(crate) mod address;
pub(crate) mod hash;
pub(crate) mod init_code;
pub(crate) mod inspect;
pub(crate) mod sign;
