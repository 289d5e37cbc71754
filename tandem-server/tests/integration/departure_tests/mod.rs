mod test_disconnect_frees_slot;
mod test_empty_room_destroyed;
