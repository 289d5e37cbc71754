mod test_join_outcomes;
