/// Associates a submitted operation with its completion.
///
/// The value is carried through the kernel untouched as the completion's
/// `user_data`, so every operation in flight at the same time needs a
/// distinct `Token`.
///
/// ```
/// use uring_connect::Token;
///
/// assert_ne!(Token::CONNECT, Token::TIMEOUT);
/// assert_eq!(u64::from(Token(7)), 7);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u64);

impl Token {
    /// Tag of an asynchronous connect.
    pub const CONNECT: Token = Token(1);
    /// Tag of the readiness watch used while a connect is in progress.
    pub const POLL: Token = Token(2);
    /// Tag of the timeout linked to a connect.
    pub const TIMEOUT: Token = Token(3);
}

impl From<Token> for u64 {
    fn from(val: Token) -> u64 {
        val.0
    }
}
