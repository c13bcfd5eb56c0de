/// A clocked component, driven once per simulated cycle.
pub trait Component {
    fn cycle(&mut self, cycle: u64);
}
