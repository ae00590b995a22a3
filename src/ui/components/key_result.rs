/// What a component did with a key.
///
/// Components return this so the owner can chain handlers: a component that
/// passes on a key leaves it for the next one in line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed; nothing for the owner to do
  Handled,
  /// Consumed, with an event for the owner
  Event(T),
  /// Not for this component
  NotHandled,
}

impl<T> KeyResult<T> {
  /// True unless the key was passed on.
  pub fn consumed(&self) -> bool {
    !matches!(self, KeyResult::NotHandled)
  }
}
