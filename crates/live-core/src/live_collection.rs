/// The collection surface a list diff drives.
///
/// A diff pass reads the current state through [`length`](Self::length) and
/// [`at`](Self::at) and expresses every change as a combination of the
/// remaining operations. `swap` and `move_item` are derived from `attach` and
/// `detach`.
pub trait LiveCollection {
    type Handle: Copy;
    type Value;

    fn length(&self) -> usize;
    fn at(&self, index: usize) -> Self::Value;
    fn attach(&mut self, index: usize, item: Self::Handle);
    fn detach(&mut self, index: usize) -> Self::Handle;
    fn create(&mut self, index: usize, value: Self::Value) -> Self::Handle;
    fn destroy(&mut self, _item: Self::Handle) {}
    fn update_value(&mut self, _index: usize, _value: Self::Value) {}

    fn swap(&mut self, first: usize, second: usize) {
        let start = first.min(second);
        let end = first.max(second);
        if start == end {
            return;
        }
        let end_item = self.detach(end);
        if end - start > 1 {
            let start_item = self.detach(start);
            self.attach(start, end_item);
            self.attach(end, start_item);
        } else {
            self.attach(start, end_item);
        }
    }

    fn move_item(&mut self, from: usize, to: usize) {
        let item = self.detach(from);
        self.attach(to, item);
    }
}
